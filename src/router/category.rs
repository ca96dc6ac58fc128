use crate::{
    logic::{self, category::CategoryForm},
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
    let list = warp::path!("category" / "list")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            let categories = logic::category::list(&ctx.db).await.map_err(reject)?;
            let data = json!({ "categories": categories });
            page(&ctx, Some(&me), StatusCode::OK, "category/list.html", data).await
        });
    let create_form = warp::path!("category" / "create")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            form_page(&ctx, &me, StatusCode::OK, None, &CategoryForm::default(), None).await
        });
    let create = warp::path!("category" / "create")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<CategoryForm>())
        .and_then(create);
    let update_form = warp::path!("category" / i32 / "update")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            let category = logic::category::get(&ctx.db, id).await.map_err(reject)?;
            let form = CategoryForm::from(&category);
            form_page(&ctx, &me, StatusCode::OK, Some(id), &form, None).await
        });
    let update = warp::path!("category" / i32 / "update")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<CategoryForm>())
        .and_then(update);
    let delete = warp::path!("category" / i32 / "delete")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            logic::category::delete(&ctx.db, id).await.map_err(reject)?;
            redirect("/category/list")
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
    form: &CategoryForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let (title, action) = match id {
        Some(id) => ("Edit a category".to_owned(), format!("/category/{}/update", id)),
        None => ("Add a new category".to_owned(), "/category/create".to_owned()),
    };
    let data = json!({ "title": title, "action": action, "form": form, "error": error });
    page(ctx, Some(me), status, "category/form.html", data).await
}

async fn create(me: Me, ctx: Ctx, form: CategoryForm) -> Result<Response<Body>, Rejection> {
    match logic::category::create(&ctx.db, &form).await {
        Ok(_) => redirect("/category/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, None, &form, Some(error)).await
        }
    }
}

async fn update(
    id: i32,
    me: Me,
    ctx: Ctx,
    form: CategoryForm,
) -> Result<Response<Body>, Rejection> {
    match logic::category::update(&ctx.db, id, &form).await {
        Ok(()) => redirect("/category/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, Some(id), &form, Some(error)).await
        }
    }
}
