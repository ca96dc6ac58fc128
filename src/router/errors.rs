use crate::{
    router::util::{redirect, BadRequest, Forbidden, Internal, LoginRequired, Missing},
    util::log_err,
    view::render_html,
};
use serde_json::json;
use warp::{
    http::{Response, StatusCode},
    hyper::Body,
    reject::{MethodNotAllowed, PayloadTooLarge},
    Rejection,
};

/// Turns the rejections the routes produce into pages.
pub async fn recover(rejection: Rejection) -> Result<Response<Body>, Rejection> {
    if let Some(Internal(err)) = rejection.find::<Internal>() {
        log_err(err);
        return Ok(error_page(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong on our side. The error has been logged.",
        ));
    }
    if rejection.find::<LoginRequired>().is_some() {
        return redirect("/auth/login");
    }
    if rejection.find::<Forbidden>().is_some() {
        return Ok(error_page(
            StatusCode::FORBIDDEN,
            "You are not allowed to do that.",
        ));
    }
    if let Some(Missing(msg)) = rejection.find::<Missing>() {
        return Ok(error_page(StatusCode::NOT_FOUND, msg));
    }
    if let Some(BadRequest(msg)) = rejection.find::<BadRequest>() {
        return Ok(error_page(StatusCode::BAD_REQUEST, msg));
    }
    if rejection.find::<PayloadTooLarge>().is_some() {
        return Ok(error_page(
            StatusCode::PAYLOAD_TOO_LARGE,
            "That upload is too large.",
        ));
    }
    if rejection.is_not_found() {
        return Ok(error_page(StatusCode::NOT_FOUND, "Page not found."));
    }
    if rejection.find::<MethodNotAllowed>().is_some() {
        return Ok(error_page(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed.",
        ));
    }
    Err(rejection)
}

/// Renders the error page. Should that fail too, the message is sent as plain text.
fn error_page(status: StatusCode, message: &str) -> Response<Body> {
    let data = json!({
        "me": null,
        "ongoing": 0,
        "error": null,
        "status": status.as_u16(),
        "message": message,
    });
    match render_html(status, "error.html", data) {
        Ok(response) => response,
        Err(err) => {
            log_err(&err);
            let mut response = Response::new(Body::from(format!("{}\n\n{}", status, message)));
            *response.status_mut() = status;
            response
        }
    }
}
