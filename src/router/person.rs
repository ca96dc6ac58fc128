use crate::{
    logic::{self, person::PersonForm},
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
    let list = warp::path!("person" / "list")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(list);
    let info = warp::path!("person" / i32 / "info")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(info);
    let create_form = warp::path!("person" / "create")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            form_page(&ctx, &me, StatusCode::OK, None, &PersonForm::default(), None).await
        });
    let create = warp::path!("person" / "create")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<PersonForm>())
        .and_then(create);
    let update_form = warp::path!("person" / i32 / "update")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(update_form);
    let update = warp::path!("person" / i32 / "update")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<PersonForm>())
        .and_then(update);
    let delete = warp::path!("person" / i32 / "delete")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            logic::person::delete(&ctx.db, id).await.map_err(reject)?;
            redirect("/person/list")
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
        .or(delete)
        .unify()
        .boxed()
}

async fn list(me: Me, ctx: Ctx) -> Result<Response<Body>, Rejection> {
    let persons = logic::person::list(&ctx.db).await.map_err(reject)?;
    page(&ctx, Some(&me), StatusCode::OK, "person/list.html", json!({ "persons": persons })).await
}

async fn info(id: i32, me: Me, ctx: Ctx) -> Result<Response<Body>, Rejection> {
    let (person, meals) = logic::person::info(&ctx.db, id).await.map_err(reject)?;
    let data = json!({ "person": person, "meals": meals });
    page(&ctx, Some(&me), StatusCode::OK, "person/info.html", data).await
}

async fn form_page(
    ctx: &Ctx,
    me: &Me,
    status: StatusCode,
    id: Option<i32>,
    form: &PersonForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let (title, action) = match id {
        Some(id) => ("Edit a person".to_owned(), format!("/person/{}/update", id)),
        None => ("Add a new person".to_owned(), "/person/create".to_owned()),
    };
    let data = json!({
        "title": title,
        "action": action,
        "updating": id.is_some(),
        "form": form,
        "error": error,
    });
    page(ctx, Some(me), status, "person/form.html", data).await
}

async fn create(me: Me, ctx: Ctx, form: PersonForm) -> Result<Response<Body>, Rejection> {
    match logic::person::create(&ctx.db, &form).await {
        Ok(_) => redirect("/person/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, None, &form, Some(error)).await
        }
    }
}

async fn update_form(id: i32, me: Me, ctx: Ctx) -> Result<Response<Body>, Rejection> {
    let person = logic::person::get(&ctx.db, id).await.map_err(reject)?;
    form_page(&ctx, &me, StatusCode::OK, Some(id), &PersonForm::from(&person), None).await
}

async fn update(id: i32, me: Me, ctx: Ctx, form: PersonForm) -> Result<Response<Body>, Rejection> {
    match logic::person::update(&ctx.db, id, &form).await {
        Ok(()) => redirect("/person/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, Some(id), &form, Some(error)).await
        }
    }
}
