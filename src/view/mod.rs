//! Rendering to templates.
//!
//! > View is the only module that knows anything about HTML, or JSON, or other "renderings" of the
//! > response. I'm happy to call this "view" in common with traditional stateless MVC, because
//! > it's role is largely the same.
//!
//! Templates and static assets are compiled into the binary.

use failure::{format_err, Fallible};
use packer::Packer;
use serde::Serialize;
use tera::{Context, Tera};
use warp::{
    http::{header::CONTENT_TYPE, Response, StatusCode},
    hyper::Body,
};

const TEMPLATE_DIR: &str = "src/view/templates/";
const STATIC_DIR: &str = "src/static/";

#[derive(Packer)]
#[packer(source = "src/view/templates")]
struct Templates;

#[derive(Packer)]
#[packer(source = "src/static")]
struct Assets;

lazy_static::lazy_static! {
    static ref TERA: Result<Tera, tera::Error> = {
        let mut tera = Tera::default();
        let templates = Templates::list()
            .filter_map(|path| {
                let name = path.trim_start_matches(TEMPLATE_DIR);
                Templates::get_str(path).map(|body| (name, body))
            })
            .collect::<Vec<_>>();
        tera.add_raw_templates(templates)?;
        Ok(tera)
    };
}

/// Checks that the templates compiled. Rendering fails until they do, so this is meant to be
/// called once at startup.
pub fn check() -> Fallible<()> {
    templates().map(|_| ())
}

fn templates() -> Fallible<&'static Tera> {
    TERA.as_ref()
        .map_err(|err| format_err!("Couldn't compile the templates: {:?}", err))
}

/// Renders a template as HTML to a String.
pub fn render<T: Serialize>(name: &str, data: T) -> Fallible<String> {
    let context = Context::from_serialize(data)?;
    templates()?
        .render(name, &context)
        .map_err(|err| format_err!("Couldn't render {}: {:?}", name, err))
}

/// Renders a template as HTML to a response with the given status.
pub fn render_html<T: Serialize>(status: StatusCode, name: &str, data: T) -> Fallible<Response<Body>> {
    let body = render(name, data)?;
    let response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(body))?;
    Ok(response)
}

/// Finds a static asset by its name under `/static/`.
pub fn asset(name: &str) -> Option<&'static [u8]> {
    if name.contains("..") {
        return None;
    }
    Assets::get(name).or_else(|| Assets::get(&format!("{}{}", STATIC_DIR, name)))
}

#[cfg(test)]
mod tests {
    use super::{asset, check, render};
    use serde_json::json;

    #[test]
    fn templates_compile() {
        check().unwrap();
        for name in &["base.html", "index.html", "meal/info.html", "user/form.html"] {
            assert!(super::templates().unwrap().get_template_names().any(|t| t == *name));
        }
    }

    #[test]
    fn login_page_renders_errors() {
        let html = render(
            "login.html",
            json!({
                "me": null,
                "ongoing": 0,
                "error": "Incorrect username.",
                "form": { "mail": "nobody@lsg.be" },
            }),
        )
        .unwrap();
        assert!(html.contains("Incorrect username."));
        assert!(html.contains("nobody@lsg.be"));
    }

    #[test]
    fn assets() {
        assert!(asset("style.css").is_some());
        assert!(asset("administrator.png").is_some());
        assert!(asset("../Cargo.toml").is_none());
        assert!(asset("nope.css").is_none());
    }
}
