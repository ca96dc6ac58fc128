use crate::{
    logic::{self, food::FoodForm},
    router::{
        auth::{admin_required, login_required},
        util::{form, form_error, page, redirect, reject, with},
        Ctx,
    },
    schema::Me,
};
use serde_json::json;
use warp::{
    http::{Response, StatusCode},
    hyper::Body,
    Filter, Rejection,
};

pub fn routes(ctx: &Ctx) -> Resp!() {
    let list = warp::path!("food" / "list")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            let foods = logic::food::list(&ctx.db).await.map_err(reject)?;
            page(&ctx, Some(&me), StatusCode::OK, "food/list.html", json!({ "foods": foods })).await
        });
    let create_form = warp::path!("food" / "create")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            form_page(&ctx, &me, StatusCode::OK, None, &FoodForm::default(), None).await
        });
    let create = warp::path!("food" / "create")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<FoodForm>())
        .and_then(create);
    let update_form = warp::path!("food" / i32 / "update")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            let food = logic::food::get(&ctx.db, id).await.map_err(reject)?;
            form_page(&ctx, &me, StatusCode::OK, Some(id), &FoodForm::from(&food), None).await
        });
    let update = warp::path!("food" / i32 / "update")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<FoodForm>())
        .and_then(update);
    let delete = warp::path!("food" / i32 / "delete")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            logic::food::delete(&ctx.db, id).await.map_err(reject)?;
            redirect("/food/list")
        });

    list.or(create_form)
        .unify()
        .or(create)
        .unify()
        .or(update_form)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .boxed()
}

async fn form_page(
    ctx: &Ctx,
    me: &Me,
    status: StatusCode,
    id: Option<i32>,
    form: &FoodForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let categories = logic::category::list(&ctx.db).await.map_err(reject)?;
    let (title, action) = match id {
        Some(id) => ("Edit a food".to_owned(), format!("/food/{}/update", id)),
        None => ("Add a new food".to_owned(), "/food/create".to_owned()),
    };
    let data = json!({
        "title": title,
        "action": action,
        "form": form,
        "categories": categories,
        "error": error,
    });
    page(ctx, Some(me), status, "food/form.html", data).await
}

async fn create(me: Me, ctx: Ctx, form: FoodForm) -> Result<Response<Body>, Rejection> {
    match logic::food::create(&ctx.db, &me, &form).await {
        Ok(_) => redirect("/food/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, None, &form, Some(error)).await
        }
    }
}

async fn update(id: i32, me: Me, ctx: Ctx, form: FoodForm) -> Result<Response<Body>, Rejection> {
    match logic::food::update(&ctx.db, id, &form).await {
        Ok(()) => redirect("/food/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, Some(id), &form, Some(error)).await
        }
    }
}
