use crate::{
    logic::{self, auth::LoginForm},
    router::{
        util::{form, form_error, page, reject, with, Forbidden, LoginRequired},
        Ctx,
    },
    schema::Me,
};
use serde_json::json;
use warp::{
    http::{
        header::{LOCATION, SET_COOKIE},
        Response, StatusCode,
    },
    hyper::Body,
    Filter, Rejection,
};

/// A filter that authenticates the user via their cookie, if they have one.
pub fn opt_auth(ctx: &Ctx) -> impl Clone + Filter<Extract = (Option<Me>,), Error = Rejection> {
    warp::cookie::optional::<String>("auth")
        .and(with(ctx.clone()))
        .and_then(|token: Option<String>, ctx: Ctx| async move {
            match token {
                Some(token) => logic::auth::authed_user(&ctx.db, &token)
                    .await
                    .map_err(reject),
                None => Ok(None),
            }
        })
}

/// A filter that requires the user to be logged in, redirecting them to the login page otherwise.
pub fn login_required(ctx: &Ctx) -> impl Clone + Filter<Extract = (Me,), Error = Rejection> {
    opt_auth(ctx).and_then(|me: Option<Me>| async move {
        me.ok_or_else(|| warp::reject::custom(LoginRequired))
    })
}

/// A filter that requires the user to be an administrator.
pub fn admin_required(ctx: &Ctx) -> impl Clone + Filter<Extract = (Me,), Error = Rejection> {
    login_required(ctx).and_then(|me: Me| async move {
        if me.admin {
            Ok(me)
        } else {
            Err(warp::reject::custom(Forbidden))
        }
    })
}

/// Logging in and out.
pub fn routes(ctx: &Ctx) -> Resp!() {
    let login_form = warp::path!("auth" / "login")
        .and(warp::get())
        .and(opt_auth(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Option<Me>, ctx: Ctx| async move {
            login_page(&ctx, me.as_ref(), StatusCode::OK, &LoginForm::default(), None).await
        });
    let login_post = warp::path!("auth" / "login")
        .and(warp::post())
        .and(with(ctx.clone()))
        .and(form::<LoginForm>())
        .and_then(login);
    let logout_get = warp::path!("auth" / "logout")
        .and(warp::get())
        .and(warp::cookie::optional::<String>("auth"))
        .and(with(ctx.clone()))
        .and_then(logout);

    login_form
        .or(login_post)
        .unify()
        .or(logout_get)
        .unify()
        .boxed()
}

async fn login_page(
    ctx: &Ctx,
    me: Option<&Me>,
    status: StatusCode,
    form: &LoginForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    page(
        ctx,
        me,
        status,
        "login.html",
        json!({ "form": form, "error": error }),
    )
    .await
}

async fn login(ctx: Ctx, form: LoginForm) -> Result<Response<Body>, Rejection> {
    match logic::auth::login(&ctx.db, &form).await {
        Ok(token) => Response::builder()
            .status(StatusCode::FOUND)
            .header(LOCATION, "/")
            .header(SET_COOKIE, format!("auth={}; HttpOnly; Path=/", token))
            .body(Body::empty())
            .map_err(|err| reject(err.into())),
        Err(err) => {
            let error = form_error(err)?;
            login_page(&ctx, None, StatusCode::BAD_REQUEST, &form, Some(error)).await
        }
    }
}

async fn logout(token: Option<String>, ctx: Ctx) -> Result<Response<Body>, Rejection> {
    if let Some(token) = token {
        logic::auth::logout(&ctx.db, &token)
            .await
            .map_err(reject)?;
    }
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, "/")
        .header(SET_COOKIE, "auth=; Max-Age=0; HttpOnly; Path=/")
        .body(Body::empty())
        .map_err(|err| reject(err.into()))
}
