use crate::{
    logic::{self, version::VersionForm},
    router::{
        auth::admin_required,
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

/// Tray hardware versions. All of these are for administrators.
pub fn routes(ctx: &Ctx) -> Resp!() {
    let list = warp::path!("version" / "list")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            let versions = logic::version::list(&ctx.db).await.map_err(reject)?;
            let data = json!({ "versions": versions });
            page(&ctx, Some(&me), StatusCode::OK, "version/list.html", data).await
        });
    let create_form = warp::path!("version" / "create")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            form_page(&ctx, &me, StatusCode::OK, None, &VersionForm::default(), None).await
        });
    let create = warp::path!("version" / "create")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<VersionForm>())
        .and_then(create);
    let update_form = warp::path!("version" / i32 / "update")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            let version = logic::version::get(&ctx.db, id).await.map_err(reject)?;
            let form = VersionForm::from(&version);
            form_page(&ctx, &me, StatusCode::OK, Some(id), &form, None).await
        });
    let update = warp::path!("version" / i32 / "update")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<VersionForm>())
        .and_then(update);
    let delete = warp::path!("version" / i32 / "delete")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            logic::version::delete(&ctx.db, id).await.map_err(reject)?;
            redirect("/version/list")
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
    form: &VersionForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let (title, action) = match id {
        Some(id) => ("Edit a version".to_owned(), format!("/version/{}/update", id)),
        None => ("Add a new version".to_owned(), "/version/create".to_owned()),
    };
    let data = json!({ "title": title, "action": action, "form": form, "error": error });
    page(ctx, Some(me), status, "version/form.html", data).await
}

async fn create(me: Me, ctx: Ctx, form: VersionForm) -> Result<Response<Body>, Rejection> {
    match logic::version::create(&ctx.db, &form).await {
        Ok(_) => redirect("/version/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, None, &form, Some(error)).await
        }
    }
}

async fn update(id: i32, me: Me, ctx: Ctx, form: VersionForm) -> Result<Response<Body>, Rejection> {
    match logic::version::update(&ctx.db, id, &form).await {
        Ok(()) => redirect("/version/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, Some(id), &form, Some(error)).await
        }
    }
}
