use crate::{
    logic::{
        self,
        tray::{ConnectForm, TrayForm},
    },
    router::{
        auth::admin_required,
        plain,
        util::{form, form_error, multipart, page, redirect, reject, remote_ip, with, Multipart},
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
    admin(ctx).or(device(ctx)).unify().boxed()
}

/// Managing trays, for administrators.
fn admin(ctx: &Ctx) -> Resp!() {
    let list = warp::path!("tray" / "list")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            let trays = logic::tray::list(&ctx.db, ctx.heartbeat_timeout)
                .await
                .map_err(reject)?;
            page(&ctx, Some(&me), StatusCode::OK, "tray/list.html", json!({ "trays": trays })).await
        });
    let create_form = warp::path!("tray" / "create")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            form_page(&ctx, &me, StatusCode::OK, None, &TrayForm::default(), None).await
        });
    let create = warp::path!("tray" / "create")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<TrayForm>())
        .and_then(create);
    let update_form = warp::path!("tray" / i32 / "update")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            let tray = logic::tray::get(&ctx.db, id).await.map_err(reject)?;
            form_page(&ctx, &me, StatusCode::OK, Some(id), &TrayForm::from(&tray), None).await
        });
    let update = warp::path!("tray" / i32 / "update")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<TrayForm>())
        .and_then(update);
    let delete = warp::path!("tray" / i32 / "delete")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            logic::tray::delete(&ctx.db, id).await.map_err(reject)?;
            redirect("/tray/list")
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

/// The endpoints the trays call. These don't need a session.
fn device(ctx: &Ctx) -> Resp!() {
    let connect = warp::path!("tray" / "connect")
        .and(warp::post())
        .and(with(ctx.clone()))
        .and(remote_ip())
        .and(form::<ConnectForm>())
        .and_then(|ctx: Ctx, remote: Option<String>, form: ConnectForm| async move {
            logic::tray::connect(&ctx.db, &form, remote)
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(ok())
        });
    let data = warp::path!("tray" / "data")
        .and(warp::post())
        .and(with(ctx.clone()))
        .and(remote_ip())
        .and(multipart())
        .and_then(data);

    connect.or(data).unify().boxed()
}

async fn form_page(
    ctx: &Ctx,
    me: &Me,
    status: StatusCode,
    id: Option<i32>,
    form: &TrayForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let versions = logic::tray::versions(&ctx.db).await.map_err(reject)?;
    let (title, action) = match id {
        Some(id) => ("Edit a tray".to_owned(), format!("/tray/{}/update", id)),
        None => ("Add a new tray".to_owned(), "/tray/create".to_owned()),
    };
    let data = json!({
        "title": title,
        "action": action,
        "updating": id.is_some(),
        "form": form,
        "versions": versions,
        "error": error,
    });
    page(ctx, Some(me), status, "tray/form.html", data).await
}

async fn create(me: Me, ctx: Ctx, form: TrayForm) -> Result<Response<Body>, Rejection> {
    match logic::tray::create(&ctx.db, &form).await {
        Ok(_) => redirect("/tray/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, None, &form, Some(error)).await
        }
    }
}

async fn update(id: i32, me: Me, ctx: Ctx, form: TrayForm) -> Result<Response<Body>, Rejection> {
    match logic::tray::update(&ctx.db, id, &form).await {
        Ok(()) => redirect("/tray/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, Some(id), &form, Some(error)).await
        }
    }
}

async fn data(
    ctx: Ctx,
    remote: Option<String>,
    mut body: Multipart,
) -> Result<Response<Body>, Rejection> {
    let name = body.field("name").to_owned();
    let data = body.file("data");
    let image = body.file("image");
    let _ = logic::tray::store_results(&ctx.db, &ctx.uploads, &name, data, image, remote)
        .await
        .map_err(reject)?;
    Ok(ok())
}

fn ok() -> Response<Body> {
    plain(StatusCode::OK, "text/plain; charset=utf-8", Body::from("OK"))
}
