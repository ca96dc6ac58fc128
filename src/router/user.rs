use crate::{
    logic::{self, user::UserForm},
    router::{
        auth::{admin_required, login_required},
        util::{form_error, multipart, page, redirect, reject, with, Multipart},
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
    let list = warp::path!("user" / "list")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(list);
    let create_form = warp::path!("user" / "create")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            form_page(&ctx, &me, StatusCode::OK, None, &UserForm::default(), None).await
        });
    let create = warp::path!("user" / "create")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(multipart())
        .and_then(create);
    let update_form = warp::path!("user" / i32 / "update")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(update_form);
    let update = warp::path!("user" / i32 / "update")
        .and(warp::post())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and(multipart())
        .and_then(update);
    let delete = warp::path!("user" / i32 / "delete")
        .and(warp::post())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(delete);

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

async fn list(me: Me, ctx: Ctx) -> Result<Response<Body>, Rejection> {
    let users = logic::user::list(&ctx.db).await.map_err(reject)?;
    page(&ctx, Some(&me), StatusCode::OK, "user/list.html", json!({ "users": users })).await
}

async fn form_page(
    ctx: &Ctx,
    me: &Me,
    status: StatusCode,
    id: Option<i32>,
    form: &UserForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let persons = logic::person::list_active(&ctx.db)
        .await
        .map_err(reject)?;
    let (title, action) = match id {
        Some(id) => ("Edit a user".to_owned(), format!("/user/{}/update", id)),
        None => ("Add a new user".to_owned(), "/user/create".to_owned()),
    };
    let data = json!({
        "title": title,
        "action": action,
        "updating": id.is_some(),
        "form": form,
        "persons": persons,
        "error": error,
    });
    page(ctx, Some(me), status, "user/form.html", data).await
}

async fn create(me: Me, ctx: Ctx, mut body: Multipart) -> Result<Response<Body>, Rejection> {
    let form = body.form::<UserForm>()?;
    let image = body.file("image");
    match logic::user::create(&ctx.db, &ctx.uploads, &form, image).await {
        Ok(_) => redirect("/user/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, None, &form, Some(error)).await
        }
    }
}

async fn update_form(id: i32, me: Me, ctx: Ctx) -> Result<Response<Body>, Rejection> {
    let user = logic::user::get_editable(&ctx.db, &me, id)
        .await
        .map_err(reject)?;
    form_page(&ctx, &me, StatusCode::OK, Some(id), &UserForm::from(&user), None).await
}

async fn update(id: i32, me: Me, ctx: Ctx, mut body: Multipart) -> Result<Response<Body>, Rejection> {
    let form = body.form::<UserForm>()?;
    let image = body.file("image");
    match logic::user::update(&ctx.db, &ctx.uploads, &me, id, &form, image).await {
        Ok(()) if me.admin => redirect("/user/list"),
        Ok(()) => redirect("/"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, Some(id), &form, Some(error)).await
        }
    }
}

async fn delete(id: i32, me: Me, ctx: Ctx) -> Result<Response<Body>, Rejection> {
    logic::user::delete(&ctx.db, &me, id)
        .await
        .map_err(reject)?;
    if me.admin {
        redirect("/user/list")
    } else {
        // Their own account is gone, and their session with it.
        redirect("/auth/logout")
    }
}
