use crate::{
    logic::{self, bug::BugForm},
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

/// Bug reports. Anyone logged in may report one; administrators mark them corrected.
pub fn routes(ctx: &Ctx) -> Resp!() {
    let list = warp::path!("bug" / "list")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            let bugs = logic::bug::list(&ctx.db).await.map_err(reject)?;
            page(&ctx, Some(&me), StatusCode::OK, "bug/list.html", json!({ "bugs": bugs })).await
        });
    let create_form = warp::path!("bug" / "create")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            form_page(&ctx, &me, StatusCode::OK, &BugForm::default(), None).await
        });
    let create = warp::path!("bug" / "create")
        .and(warp::post())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<BugForm>())
        .and_then(create);
    let delete = warp::path!("bug" / i32 / "delete")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            logic::bug::delete(&ctx.db, id).await.map_err(reject)?;
            redirect("/bug/list")
        });

    list.or(create_form)
        .unify()
        .or(create)
        .unify()
        .or(delete)
        .unify()
        .boxed()
}

async fn form_page(
    ctx: &Ctx,
    me: &Me,
    status: StatusCode,
    form: &BugForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let data = json!({ "form": form, "error": error });
    page(ctx, Some(me), status, "bug/form.html", data).await
}

async fn create(me: Me, ctx: Ctx, form: BugForm) -> Result<Response<Body>, Rejection> {
    match logic::bug::create(&ctx.db, &me, &form).await {
        Ok(_) => redirect("/bug/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, &form, Some(error)).await
        }
    }
}
