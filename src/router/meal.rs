use crate::{
    logic::{self, files::content_type, meal::MealForm},
    router::{
        auth::{admin_required, login_required},
        util::{form, form_error, page, redirect, reject, with},
        Ctx,
    },
    schema::Me,
};
use serde_json::json;
use warp::{
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        Response, StatusCode,
    },
    hyper::Body,
    Filter, Rejection,
};

pub fn routes(ctx: &Ctx) -> Resp!() {
    let list = warp::path!("meal" / "list")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            let meals = logic::meal::list(&ctx.db).await.map_err(reject)?;
            page(&ctx, Some(&me), StatusCode::OK, "meal/list.html", json!({ "meals": meals })).await
        });
    let info = warp::path!("meal" / i32 / "info")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            let info = logic::meal::info(&ctx.db, &ctx.uploads, id)
                .await
                .map_err(reject)?;
            let data = json!({ "meal": info.meal, "data": info.data, "image": info.image });
            page(&ctx, Some(&me), StatusCode::OK, "meal/info.html", data).await
        });
    let create_form = warp::path!("meal" / "create")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            form_page(&ctx, &me, StatusCode::OK, None, &MealForm::default(), None).await
        });
    let create = warp::path!("meal" / "create")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<MealForm>())
        .and_then(create);
    let update_form = warp::path!("meal" / i32 / "update")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            let meal = logic::meal::get(&ctx.db, id).await.map_err(reject)?;
            form_page(&ctx, &me, StatusCode::OK, Some(id), &MealForm::from(&meal), None).await
        });
    let update = warp::path!("meal" / i32 / "update")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<MealForm>())
        .and_then(update);
    let finished = warp::path!("meal" / i32 / "finished")
        .and(warp::post())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            logic::meal::finish(&ctx.db, &me, id).await.map_err(reject)?;
            redirect("/")
        });
    let delete = warp::path!("meal" / i32 / "delete")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            logic::meal::delete(&ctx.db, id).await.map_err(reject)?;
            redirect("/meal/list")
        });
    let download = warp::path!("meal" / i32 / "download")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            let (name, contents) = logic::meal::data_file(&ctx.db, &ctx.uploads, id)
                .await
                .map_err(reject)?;
            file_response(&name, contents, true)
        });
    let image = warp::path!("meal" / i32 / "image")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            let (name, contents) = logic::meal::image_file(&ctx.db, &ctx.uploads, id)
                .await
                .map_err(reject)?;
            file_response(&name, contents, false)
        });

    list.or(info)
        .unify()
        .or(create_form)
        .unify()
        .or(create)
        .unify()
        .or(update_form)
        .unify()
        .or(update)
        .unify()
        .or(finished)
        .unify()
        .or(delete)
        .unify()
        .or(download)
        .unify()
        .or(image)
        .unify()
        .boxed()
}

async fn form_page(
    ctx: &Ctx,
    me: &Me,
    status: StatusCode,
    id: Option<i32>,
    form: &MealForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let choices = logic::meal::choices(&ctx.db).await.map_err(reject)?;
    let (title, action) = match id {
        Some(id) => ("Edit a meal".to_owned(), format!("/meal/{}/update", id)),
        None => ("Add a new meal".to_owned(), "/meal/create".to_owned()),
    };
    let data = json!({
        "title": title,
        "action": action,
        "updating": id.is_some(),
        "form": form,
        "menus": choices.menus,
        "persons": choices.persons,
        "trays": choices.trays,
        "error": error,
    });
    page(ctx, Some(me), status, "meal/form.html", data).await
}

async fn create(me: Me, ctx: Ctx, form: MealForm) -> Result<Response<Body>, Rejection> {
    match logic::meal::create(&ctx.db, &me, &form).await {
        Ok(_) => redirect("/"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, None, &form, Some(error)).await
        }
    }
}

async fn update(id: i32, me: Me, ctx: Ctx, form: MealForm) -> Result<Response<Body>, Rejection> {
    match logic::meal::update(&ctx.db, id, &form).await {
        Ok(()) => redirect("/meal/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, Some(id), &form, Some(error)).await
        }
    }
}

/// Sends a file a tray uploaded, either for download or to be shown inline.
fn file_response(name: &str, contents: Vec<u8>, attachment: bool) -> Result<Response<Body>, Rejection> {
    let disposition = if attachment { "attachment" } else { "inline" };
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type(name))
        .header(
            CONTENT_DISPOSITION,
            format!("{}; filename=\"{}\"", disposition, name),
        )
        .body(Body::from(contents))
        .map_err(|err| reject(err.into()))
}
