//! The HTTP server.
//!
//! > **Router** is the the only module that knows anything about HTTP. Every other part of the
//! > system has no knowledge of how the request is really being made. The router's responsibility
//! > is to call into the domain logic, and then render that response data with an appropriate view.
//!
//! Every route is checked in the same order: path, then method, then the permission guard, and
//! only then the body. Whatever a route rejects with is turned into a page by `errors::recover`.

mod auth;
mod bug;
mod category;
mod errors;
mod food;
mod meal;
mod menu;
mod person;
mod tray;
mod user;
mod util;
mod version;

use crate::{
    dal::{Uploads, DB},
    logic::{self, files::content_type},
    router::{
        auth::login_required,
        util::{page, reject, with, Missing},
    },
    schema::Me,
    view,
};
use failure::Fallible;
use log::info;
use serde_json::json;
use std::net::SocketAddr;
use warp::{
    http::{header::CONTENT_TYPE, Response, StatusCode},
    hyper::Body,
    Filter, Rejection,
};

/// Everything a request might need.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct Ctx {
    /// The database.
    pub db: DB,

    /// Where uploaded files go.
    pub uploads: Uploads,

    /// How long a tray stays online after its last heartbeat.
    pub heartbeat_timeout: chrono::Duration,
}

/// Starts an HTTP server at the given address, returning once it stops.
pub async fn serve_on(addr: SocketAddr, ctx: Ctx) -> Fallible<()> {
    let routes = routes(ctx).with(warp::log("lsg_web::router"));
    let (addr, server) = warp::serve(routes).try_bind_ephemeral(addr)?;
    info!("Serving on {}", addr);
    server.await;
    info!("HTTP server exited");
    Ok(())
}

/// Every route of the application.
pub fn routes(ctx: Ctx) -> Resp!() {
    pages(&ctx)
        .or(auth::routes(&ctx))
        .unify()
        .or(person::routes(&ctx))
        .unify()
        .or(user::routes(&ctx))
        .unify()
        .or(category::routes(&ctx))
        .unify()
        .or(food::routes(&ctx))
        .unify()
        .or(menu::routes(&ctx))
        .unify()
        .or(tray::routes(&ctx))
        .unify()
        .or(version::routes(&ctx))
        .unify()
        .or(bug::routes(&ctx))
        .unify()
        .or(meal::routes(&ctx))
        .unify()
        .recover(errors::recover)
        .unify()
        .boxed()
}

fn pages(ctx: &Ctx) -> Resp!() {
    let index = warp::path::end()
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(index);
    let changelog = warp::path!("changelog")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            page(&ctx, Some(&me), StatusCode::OK, "changelog.html", json!({})).await
        });
    let running = warp::path!("running")
        .and(warp::get())
        .map(|| plain(StatusCode::OK, "text/plain; charset=utf-8", "Server is running".into()));
    let assets = warp::path!("static" / String)
        .and(warp::get())
        .and_then(|name: String| async move {
            match view::asset(&name) {
                Some(contents) => Ok(plain(StatusCode::OK, content_type(&name), contents.into())),
                None => Err(warp::reject::not_found()),
            }
        });
    let avatars = warp::path!("uploads" / "avatars" / String)
        .and(warp::get())
        .and(with(ctx.clone()))
        .and_then(avatar);

    index
        .or(changelog)
        .unify()
        .or(running)
        .unify()
        .or(assets)
        .unify()
        .or(avatars)
        .unify()
        .boxed()
}

async fn index(me: Me, ctx: Ctx) -> Result<Response<Body>, Rejection> {
    let meals = logic::meal::ongoing(&ctx.db).await.map_err(reject)?;
    page(&ctx, Some(&me), StatusCode::OK, "index.html", json!({ "meals": meals })).await
}

async fn avatar(name: String, ctx: Ctx) -> Result<Response<Body>, Rejection> {
    let contents = logic::files::avatar(&ctx.uploads, &name)
        .await
        .map_err(reject)?;
    match contents {
        Some(contents) => Ok(plain(StatusCode::OK, content_type(&name), contents.into())),
        None => match view::asset(&name) {
            Some(contents) => Ok(plain(StatusCode::OK, content_type(&name), contents.into())),
            None => Err(warp::reject::custom(Missing(format!(
                "There is no avatar named {}.",
                name
            )))),
        },
    }
}

/// A response with a body that isn't a rendered template.
fn plain(status: StatusCode, content_type: &str, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    if let Ok(value) = content_type.parse() {
        let _ = response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
