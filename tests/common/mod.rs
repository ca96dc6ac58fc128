//! A fresh database and uploads directory, seeded with a little of everything.
#![allow(dead_code)]

use chrono::NaiveDate;
use lsg_web::{
    dal::{NewFood, NewMenu, NewPerson, NewTray, NewUser, NewVersion, Uploads, DB},
    logic::auth::hash_password_with,
    router::{routes, Ctx},
};
use tempfile::TempDir;
use warp::{
    http::{header::SET_COOKIE, Response},
    hyper::body::Bytes,
};

pub const ADMIN_MAIL: &str = "admin@admin.be";
pub const USER_MAIL: &str = "simple@user.be";
pub const PASSWORD: &str = "lsg";

pub const BOUNDARY: &str = "lsg-web-test-boundary";

/// Everything a test needs. The directory is removed once this is dropped.
pub struct Fixture {
    pub dir: TempDir,
    pub ctx: Ctx,
    pub admin_person: i32,
    pub user_person: i32,
    pub candidate: i32,
    pub admin: i32,
    pub user: i32,
    pub category: i32,
    pub water: i32,
    pub meat: i32,
    pub menu: i32,
    pub version: i32,
    pub tray: i32,
    pub other_tray: i32,
    pub bug: i32,
}

fn person(name: &str) -> NewPerson {
    NewPerson {
        name: name.to_owned(),
        birthdate: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        gender: "X".to_owned(),
        weight: 70.0,
        active: true,
    }
}

impl Fixture {
    pub async fn new() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("lsg.db");
        let db = DB::connect(db_path.to_str().unwrap(), 2).unwrap();
        let uploads = Uploads::open(dir.path().join("uploads")).unwrap();

        let admin_person = db.create_person(person("Admin")).await.unwrap();
        let user_person = db.create_person(person("Simple")).await.unwrap();
        let candidate = db.create_person(person("Candidate")).await.unwrap();
        let admin = db
            .create_user(NewUser {
                person_id: admin_person,
                mail: ADMIN_MAIL.to_owned(),
                password_hash: hash_password_with(PASSWORD, 1000),
                permission: 1,
                avatar: "administrator.png".to_owned(),
            })
            .await
            .unwrap();
        let user = db
            .create_user(NewUser {
                person_id: user_person,
                mail: USER_MAIL.to_owned(),
                password_hash: hash_password_with(PASSWORD, 1000),
                permission: 2,
                avatar: "simple_user.png".to_owned(),
            })
            .await
            .unwrap();

        let category = db.create_category("Drink".to_owned()).await.unwrap();
        let water = db
            .create_food(NewFood {
                name: "Super-Water".to_owned(),
                category_id: category,
                information: "Very wet.".to_owned(),
                owner_id: admin_person,
            })
            .await
            .unwrap();
        let meat = db
            .create_food(NewFood {
                name: "Super-Meat".to_owned(),
                category_id: category,
                information: "Not a drink.".to_owned(),
                owner_id: admin_person,
            })
            .await
            .unwrap();
        let menu = db
            .create_menu(NewMenu {
                name: "Super-Menu".to_owned(),
                information: "Water only.".to_owned(),
                owner_id: admin_person,
            })
            .await
            .unwrap();
        db.add_composed(menu, water, 2).await.unwrap();

        let version = db
            .create_version(NewVersion {
                name: "Alpha 0.0.1a".to_owned(),
                release_date: NaiveDate::from_ymd_opt(2019, 9, 1).unwrap(),
            })
            .await
            .unwrap();
        let tray = db
            .create_tray(NewTray {
                name: "Super-Tray".to_owned(),
                version_id: version,
                information: "The first one.".to_owned(),
            })
            .await
            .unwrap();
        let other_tray = db
            .create_tray(NewTray {
                name: "Super-Tray II".to_owned(),
                version_id: version,
                information: "The second one.".to_owned(),
            })
            .await
            .unwrap();
        let bug = db
            .create_bug(
                "Super-Bug".to_owned(),
                "Everything is upside down.".to_owned(),
                NaiveDate::from_ymd_opt(2019, 10, 1).unwrap(),
            )
            .await
            .unwrap();

        Fixture {
            dir,
            ctx: Ctx {
                db,
                uploads,
                heartbeat_timeout: chrono::Duration::seconds(30),
            },
            admin_person,
            user_person,
            candidate,
            admin,
            user,
            category,
            water,
            meat,
            menu,
            version,
            tray,
            other_tray,
            bug,
        }
    }

    pub fn db(&self) -> &DB {
        &self.ctx.db
    }

    /// Sends a request through every route.
    pub async fn send(&self, request: warp::test::RequestBuilder) -> Response<Bytes> {
        request.reply(&routes(self.ctx.clone())).await
    }

    /// Logs in, returning the cookie to send along with later requests.
    pub async fn login(&self, mail: &str) -> String {
        let body = format!("mail={}&password={}", mail, PASSWORD);
        let response = self.send(post_form("/auth/login", None, &body)).await;
        assert_eq!(response.status(), 302);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        cookie.split(';').next().unwrap().to_owned()
    }

    pub async fn admin_cookie(&self) -> String {
        self.login(ADMIN_MAIL).await
    }

    pub async fn user_cookie(&self) -> String {
        self.login(USER_MAIL).await
    }
}

pub fn get(path: &str, cookie: Option<&str>) -> warp::test::RequestBuilder {
    let request = warp::test::request().method("GET").path(path);
    match cookie {
        Some(cookie) => request.header("cookie", cookie),
        None => request,
    }
}

pub fn post_form(path: &str, cookie: Option<&str>, body: &str) -> warp::test::RequestBuilder {
    let request = warp::test::request()
        .method("POST")
        .path(path)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body.to_owned());
    match cookie {
        Some(cookie) => request.header("cookie", cookie),
        None => request,
    }
}

/// A part of a multipart body: a text field, or a file with a filename.
pub enum Part<'a> {
    Field(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn post_multipart(
    path: &str,
    cookie: Option<&str>,
    parts: &[Part<'_>],
) -> warp::test::RequestBuilder {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match *part {
            Part::Field(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, contents) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                body.extend_from_slice(contents);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let request = warp::test::request()
        .method("POST")
        .path(path)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(body);
    match cookie {
        Some(cookie) => request.header("cookie", cookie),
        None => request,
    }
}

pub fn text(response: &Response<Bytes>) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}
