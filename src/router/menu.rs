use crate::{
    logic::{
        self,
        menu::{ComponentForm, MenuForm, QuantityForm},
    },
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
    menus(ctx).or(components(ctx)).unify().boxed()
}

/// The menus themselves.
fn menus(ctx: &Ctx) -> Resp!() {
    let list = warp::path!("menu" / "list")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            let menus = logic::menu::list(&ctx.db).await.map_err(reject)?;
            page(&ctx, Some(&me), StatusCode::OK, "menu/list.html", json!({ "menus": menus })).await
        });
    let info = warp::path!("menu" / i32 / "info")
        .and(warp::get())
        .and(login_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            let (menu, foods) = logic::menu::info(&ctx.db, id).await.map_err(reject)?;
            let data = json!({ "menu": menu, "foods": foods });
            page(&ctx, Some(&me), StatusCode::OK, "menu/info.html", data).await
        });
    let create_form = warp::path!("menu" / "create")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|me: Me, ctx: Ctx| async move {
            form_page(&ctx, &me, StatusCode::OK, None, &MenuForm::default(), None).await
        });
    let create = warp::path!("menu" / "create")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<MenuForm>())
        .and_then(create);
    let update_form = warp::path!("menu" / i32 / "update")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            let menu = logic::menu::get(&ctx.db, id).await.map_err(reject)?;
            form_page(&ctx, &me, StatusCode::OK, Some(id), &MenuForm::from(&menu), None).await
        });
    let update = warp::path!("menu" / i32 / "update")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<MenuForm>())
        .and_then(update);
    let delete = warp::path!("menu" / i32 / "delete")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, _me: Me, ctx: Ctx| async move {
            logic::menu::delete(&ctx.db, id).await.map_err(reject)?;
            redirect("/menu/list")
        });
    let copy = warp::path!("menu" / i32 / "copy")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            let copy = logic::menu::copy(&ctx.db, &me, id).await.map_err(reject)?;
            redirect(&format!("/menu/{}/info", copy))
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
        .or(copy)
        .unify()
        .boxed()
}

/// The foods a menu is composed of.
fn components(ctx: &Ctx) -> Resp!() {
    let add_form = warp::path!("menu" / i32 / "add")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, me: Me, ctx: Ctx| async move {
            add_page(&ctx, &me, StatusCode::OK, id, &ComponentForm::default(), None).await
        });
    let add = warp::path!("menu" / i32 / "add")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<ComponentForm>())
        .and_then(add);
    let update_form = warp::path!("menu" / i32 / i32 / "update")
        .and(warp::get())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, food: i32, me: Me, ctx: Ctx| async move {
            let composed = logic::menu::get_component(&ctx.db, id, food)
                .await
                .map_err(reject)?;
            let form = QuantityForm {
                quantity: composed.quantity.to_string(),
            };
            component_page(&ctx, &me, StatusCode::OK, id, food, &form, None).await
        });
    let update = warp::path!("menu" / i32 / i32 / "update")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and(form::<QuantityForm>())
        .and_then(update_component);
    let remove = warp::path!("menu" / i32 / i32 / "remove")
        .and(warp::post())
        .and(admin_required(ctx))
        .and(with(ctx.clone()))
        .and_then(|id: i32, food: i32, _me: Me, ctx: Ctx| async move {
            logic::menu::remove_component(&ctx.db, id, food)
                .await
                .map_err(reject)?;
            redirect(&format!("/menu/{}/info", id))
        });

    add_form
        .or(add)
        .unify()
        .or(update_form)
        .unify()
        .or(update)
        .unify()
        .or(remove)
        .unify()
        .boxed()
}

async fn form_page(
    ctx: &Ctx,
    me: &Me,
    status: StatusCode,
    id: Option<i32>,
    form: &MenuForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let (title, action) = match id {
        Some(id) => ("Edit a menu".to_owned(), format!("/menu/{}/update", id)),
        None => ("Add a new menu".to_owned(), "/menu/create".to_owned()),
    };
    let data = json!({
        "title": title,
        "action": action,
        "updating": id.is_some(),
        "form": form,
        "error": error,
    });
    page(ctx, Some(me), status, "menu/form.html", data).await
}

async fn create(me: Me, ctx: Ctx, form: MenuForm) -> Result<Response<Body>, Rejection> {
    match logic::menu::create(&ctx.db, &me, &form).await {
        Ok(_) => redirect("/menu/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, None, &form, Some(error)).await
        }
    }
}

async fn update(id: i32, me: Me, ctx: Ctx, form: MenuForm) -> Result<Response<Body>, Rejection> {
    match logic::menu::update(&ctx.db, id, &form).await {
        Ok(()) => redirect("/menu/list"),
        Err(err) => {
            let error = form_error(err)?;
            form_page(&ctx, &me, StatusCode::BAD_REQUEST, Some(id), &form, Some(error)).await
        }
    }
}

async fn add_page(
    ctx: &Ctx,
    me: &Me,
    status: StatusCode,
    id: i32,
    form: &ComponentForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let menu = logic::menu::get(&ctx.db, id).await.map_err(reject)?;
    let foods = logic::menu::addable_foods(&ctx.db, id)
        .await
        .map_err(reject)?;
    let data = json!({ "menu": menu, "foods": foods, "form": form, "error": error });
    page(ctx, Some(me), status, "menu/add.html", data).await
}

async fn add(id: i32, me: Me, ctx: Ctx, form: ComponentForm) -> Result<Response<Body>, Rejection> {
    match logic::menu::add_component(&ctx.db, id, &form).await {
        Ok(()) => redirect(&format!("/menu/{}/info", id)),
        Err(err) => {
            let error = form_error(err)?;
            add_page(&ctx, &me, StatusCode::BAD_REQUEST, id, &form, Some(error)).await
        }
    }
}

async fn component_page(
    ctx: &Ctx,
    me: &Me,
    status: StatusCode,
    id: i32,
    food: i32,
    form: &QuantityForm,
    error: Option<String>,
) -> Result<Response<Body>, Rejection> {
    let menu = logic::menu::get(&ctx.db, id).await.map_err(reject)?;
    let food = logic::food::get(&ctx.db, food).await.map_err(reject)?;
    let data = json!({ "menu": menu, "food": food, "form": form, "error": error });
    page(ctx, Some(me), status, "menu/component.html", data).await
}

async fn update_component(
    id: i32,
    food: i32,
    me: Me,
    ctx: Ctx,
    form: QuantityForm,
) -> Result<Response<Body>, Rejection> {
    match logic::menu::update_component(&ctx.db, id, food, &form).await {
        Ok(()) => redirect(&format!("/menu/{}/info", id)),
        Err(err) => {
            let error = form_error(err)?;
            component_page(&ctx, &me, StatusCode::BAD_REQUEST, id, food, &form, Some(error)).await
        }
    }
}
