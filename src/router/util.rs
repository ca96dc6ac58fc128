use crate::{
    logic::{self, files::Upload, Refusal},
    router::Ctx,
    schema::Me,
    view::render_html,
};
use bytes::BufMut;
use failure::Fallible;
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::{collections::HashMap, convert::Infallible, net::SocketAddr};
use warp::{
    http::{header::LOCATION, Response, StatusCode},
    hyper::Body,
    multipart::{FormData, Part},
    reject::{custom, Reject},
    Filter, Rejection,
};

/// The largest form body accepted.
const FORM_LIMIT: u64 = 16 * 1024;

/// The largest multipart body accepted; these carry avatars and meal results.
const UPLOAD_LIMIT: u64 = 16 * 1024 * 1024;

/// The user needs to log in first.
#[derive(Debug)]
pub struct LoginRequired;

impl Reject for LoginRequired {}

/// The user isn't allowed to do this.
#[derive(Debug)]
pub struct Forbidden;

impl Reject for Forbidden {}

/// What was asked for doesn't exist.
#[derive(Debug)]
pub struct Missing(pub String);

impl Reject for Missing {}

/// The request couldn't be made sense of.
#[derive(Debug)]
pub struct BadRequest(pub String);

impl Reject for BadRequest {}

/// Something went wrong on our side.
#[derive(Debug)]
pub struct Internal(pub failure::Error);

impl Reject for Internal {}

/// Converts an error from the logic into a rejection.
pub fn reject(err: failure::Error) -> Rejection {
    let rejection = match logic::as_refusal(&err) {
        Some(Refusal::Invalid(msg)) => Some(custom(BadRequest(msg.clone()))),
        Some(Refusal::NotFound(msg)) => Some(custom(Missing(msg.clone()))),
        Some(Refusal::Forbidden) => Some(custom(Forbidden)),
        None => None,
    };
    rejection.unwrap_or_else(|| custom(Internal(err)))
}

/// Separates the errors that get shown next to the form that caused them from the rest, which
/// become rejections.
pub fn form_error(err: failure::Error) -> Result<String, Rejection> {
    if let Some(Refusal::Invalid(msg)) = logic::as_refusal(&err) {
        return Ok(msg.clone());
    }
    Err(reject(err))
}

/// Provides a clone of a value to every request.
pub fn with<T: 'static + Clone + Send + Sync>(
    t: T,
) -> impl Clone + Filter<Extract = (T,), Error = Infallible> {
    warp::any().map(move || t.clone())
}

/// Extracts an URL-encoded form body.
pub fn form<T: 'static + DeserializeOwned + Send>(
) -> impl Clone + Filter<Extract = (T,), Error = Rejection> {
    warp::body::content_length_limit(FORM_LIMIT).and(warp::body::form())
}

/// Extracts the address a request came from, without the port.
pub fn remote_ip() -> impl Clone + Filter<Extract = (Option<String>,), Error = Infallible> {
    warp::addr::remote().map(|addr: Option<SocketAddr>| addr.map(|addr| addr.ip().to_string()))
}

/// A redirect to the given path.
pub fn redirect(to: &str) -> Result<Response<Body>, Rejection> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, to)
        .body(Body::empty())
        .map_err(|err| reject(err.into()))
}

/// Renders a page. Every page gets the current user, and, when someone is logged in, the number
/// of meals being served.
pub async fn page(
    ctx: &Ctx,
    me: Option<&Me>,
    status: StatusCode,
    name: &str,
    mut data: Value,
) -> Result<Response<Body>, Rejection> {
    let ongoing = match me {
        Some(_) => logic::meal::count_ongoing(&ctx.db).await.map_err(reject)?,
        None => 0,
    };
    if let Value::Object(ref mut map) = data {
        let _ = map.insert("me".to_owned(), json!(me));
        let _ = map.insert("ongoing".to_owned(), json!(ongoing));
        let _ = map.entry("error").or_insert(Value::Null);
    }
    render_html(status, name, data).map_err(reject)
}

/// The text fields and files of a multipart form.
#[derive(Debug, Default)]
pub struct Multipart {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl Multipart {
    /// Deserializes the text fields as a form.
    pub fn form<T: DeserializeOwned>(&self) -> Result<T, Rejection> {
        serde_json::to_value(&self.fields)
            .and_then(serde_json::from_value)
            .map_err(|err| custom(BadRequest(format!("Invalid form: {}", err))))
    }

    /// Gets a text field.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(|s| s.as_str()).unwrap_or("")
    }

    /// Takes a file out of the form. File inputs left empty don't count.
    pub fn file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

/// Extracts a multipart form body.
pub fn multipart() -> impl Clone + Filter<Extract = (Multipart,), Error = Rejection> {
    warp::multipart::form()
        .max_length(UPLOAD_LIMIT)
        .and_then(|form: FormData| async move {
            collect_parts(form)
                .await
                .map_err(|err| custom(BadRequest(format!("Invalid upload: {}", err))))
        })
}

async fn collect_parts(form: FormData) -> Fallible<Multipart> {
    let mut multipart = Multipart::default();
    futures::pin_mut!(form);
    while let Some(part) = form.try_next().await? {
        let name = part.name().to_owned();
        let filename = part.filename().map(str::to_owned);
        let contents = read_part(part).await?;
        match filename {
            Some(ref filename) if filename.is_empty() => {}
            Some(filename) => {
                let _ = multipart
                    .files
                    .insert(name, Upload { filename, contents });
            }
            None => {
                let _ = multipart.fields.insert(name, String::from_utf8(contents)?);
            }
        }
    }
    Ok(multipart)
}

async fn read_part(part: Part) -> Fallible<Vec<u8>> {
    let mut contents = Vec::new();
    let stream = part.stream();
    futures::pin_mut!(stream);
    while let Some(chunk) = stream.try_next().await? {
        contents.put(chunk);
    }
    Ok(contents)
}
