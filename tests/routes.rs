mod common;

use chrono::{Duration, Utc};
use common::{get, post_form, post_multipart, text, Fixture, Part, USER_MAIL};
use warp::http::header::{CONTENT_DISPOSITION, LOCATION};

fn location(response: &warp::http::Response<warp::hyper::body::Bytes>) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn guarded_pages_redirect_to_login() {
    let fixture = Fixture::new().await;

    let response = fixture.send(get("/", None)).await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), "/auth/login");

    let response = fixture.send(post_form("/person/create", None, "name=x")).await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), "/auth/login");

    let response = fixture.send(get("/auth/login", None)).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn login_errors() {
    let fixture = Fixture::new().await;

    let response = fixture
        .send(post_form("/auth/login", None, "mail=nobody@lsg.be&password=lsg"))
        .await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("Incorrect username."));

    let body = format!("mail={}&password=wrong", USER_MAIL);
    let response = fixture.send(post_form("/auth/login", None, &body)).await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("Incorrect password."));

    fixture.db().deactivate_user(fixture.user).await.unwrap();
    let body = format!("mail={}&password=lsg", USER_MAIL);
    let response = fixture.send(post_form("/auth/login", None, &body)).await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("Account deactivated."));
}

#[tokio::test]
async fn sessions_end_on_logout_and_deactivation() {
    let fixture = Fixture::new().await;
    let cookie = fixture.user_cookie().await;

    let response = fixture.send(get("/", Some(&cookie))).await;
    assert_eq!(response.status(), 200);
    assert!(text(&response).contains("Active Meals"));

    fixture.db().deactivate_user(fixture.user).await.unwrap();
    let response = fixture.send(get("/", Some(&cookie))).await;
    assert_eq!(response.status(), 302);

    let cookie = fixture.admin_cookie().await;
    let response = fixture.send(get("/auth/logout", Some(&cookie))).await;
    assert_eq!(response.status(), 302);
    let response = fixture.send(get("/", Some(&cookie))).await;
    assert_eq!(response.status(), 302);
}

#[tokio::test]
async fn sessions_expire_after_thirty_days() {
    let fixture = Fixture::new().await;
    let now = Utc::now().naive_utc();
    let stale = fixture
        .db()
        .create_session_at(fixture.user, now - Duration::days(31))
        .await
        .unwrap();
    let fresh = fixture
        .db()
        .create_session_at(fixture.user, now - Duration::days(29))
        .await
        .unwrap();

    let response = fixture.send(get("/", Some(&format!("auth={}", stale)))).await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), "/auth/login");
    let response = fixture.send(get("/", Some(&format!("auth={}", fresh)))).await;
    assert_eq!(response.status(), 200);

    // Logging in clears out the stale session.
    let long_ago = now - Duration::days(365);
    let _ = fixture.user_cookie().await;
    let found = fixture.db().get_session_user(stale, long_ago).await.unwrap();
    assert!(found.is_none());
    let found = fixture.db().get_session_user(fresh, long_ago).await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn regular_users_cannot_reach_admin_routes() {
    let fixture = Fixture::new().await;
    let cookie = fixture.user_cookie().await;

    for path in &["/person/create", "/user/list", "/tray/list", "/version/list", "/meal/create"] {
        let response = fixture.send(get(path, Some(&cookie))).await;
        assert_eq!(response.status(), 403, "GET {}", path);
    }

    let response = fixture
        .send(post_form("/category/create", Some(&cookie), "name=Soup"))
        .await;
    assert_eq!(response.status(), 403);

    // Even for things that don't exist.
    let response = fixture
        .send(post_form("/person/999/delete", Some(&cookie), ""))
        .await;
    assert_eq!(response.status(), 403);
    let response = fixture.send(get("/user/999/update", Some(&cookie))).await;
    assert_eq!(response.status(), 403);

    // But everyone can read the catalog and report bugs.
    let response = fixture.send(get("/food/list", Some(&cookie))).await;
    assert_eq!(response.status(), 200);
    assert!(text(&response).contains("Super-Water"));
    let response = fixture
        .send(post_form(
            "/bug/create",
            Some(&cookie),
            "title=Cold+soup&information=The+soup+is+cold.",
        ))
        .await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), "/bug/list");
}

#[tokio::test]
async fn missing_things_are_not_found() {
    let fixture = Fixture::new().await;
    let cookie = fixture.admin_cookie().await;

    let response = fixture.send(get("/person/999/info", Some(&cookie))).await;
    assert_eq!(response.status(), 404);
    let response = fixture.send(get("/menu/999/info", Some(&cookie))).await;
    assert_eq!(response.status(), 404);
    let path = format!("/menu/{}/{}/update", fixture.menu, fixture.meat);
    let response = fixture.send(get(&path, Some(&cookie))).await;
    assert_eq!(response.status(), 404);
    let response = fixture.send(get("/no/such/page", Some(&cookie))).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn soft_delete_keeps_rows() {
    let fixture = Fixture::new().await;
    let cookie = fixture.admin_cookie().await;

    let path = format!("/person/{}/delete", fixture.candidate);
    let response = fixture.send(post_form(&path, Some(&cookie), "")).await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), "/person/list");
    let person = fixture.db().get_person(fixture.candidate).await.unwrap().unwrap();
    assert!(!person.active);

    let path = format!("/food/{}/delete", fixture.meat);
    let response = fixture.send(post_form(&path, Some(&cookie), "")).await;
    assert_eq!(response.status(), 302);
    let food = fixture.db().get_food(fixture.meat).await.unwrap().unwrap();
    assert!(!food.active);
    let response = fixture.send(get("/food/list", Some(&cookie))).await;
    assert!(!text(&response).contains("Super-Meat"));

    let path = format!("/bug/{}/delete", fixture.bug);
    let response = fixture.send(post_form(&path, Some(&cookie), "")).await;
    assert_eq!(response.status(), 302);
    let bug = fixture.db().get_bug(fixture.bug).await.unwrap().unwrap();
    assert!(bug.corrected);
}

#[tokio::test]
async fn duplicate_names_are_refused() {
    let fixture = Fixture::new().await;
    let cookie = fixture.admin_cookie().await;

    let response = fixture
        .send(post_form("/category/create", Some(&cookie), "name=+Drink+"))
        .await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("This category already exists."));

    let body = format!(
        "name=Super-Meat&category={}&information=Renamed",
        fixture.category
    );
    let path = format!("/food/{}/update", fixture.water);
    let response = fixture.send(post_form(&path, Some(&cookie), &body)).await;
    assert_eq!(response.status(), 400);
    let page = text(&response);
    assert!(page.contains("This food already exists."));
    assert!(page.contains("Renamed"));

    // Keeping its own name is fine.
    let body = format!(
        "name=Super-Water&category={}&information=Still+wet",
        fixture.category
    );
    let response = fixture.send(post_form(&path, Some(&cookie), &body)).await;
    assert_eq!(response.status(), 302);

    let body = format!(
        "name=Super-Tray&version={}&information=Again",
        fixture.version
    );
    let response = fixture
        .send(post_form("/tray/create", Some(&cookie), &body))
        .await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("Tray Super-Tray is already registered."));
}

#[tokio::test]
async fn validation_errors_come_in_order() {
    let fixture = Fixture::new().await;
    let cookie = fixture.admin_cookie().await;

    let response = fixture
        .send(post_form("/person/create", Some(&cookie), ""))
        .await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("Name is required."));

    let response = fixture
        .send(post_form(
            "/person/create",
            Some(&cookie),
            "name=Bob&birthdate=1990-13-40&gender=M&weight=80",
        ))
        .await;
    assert!(text(&response).contains("You must enter a valid birthdate."));

    let response = fixture
        .send(post_form(
            "/version/create",
            Some(&cookie),
            "name=Beta&release_date=tomorrow",
        ))
        .await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("You must enter a valid date."));

    let path = format!("/menu/{}/add", fixture.menu);
    let body = format!("food={}&quantity=-1", fixture.meat);
    let response = fixture.send(post_form(&path, Some(&cookie), &body)).await;
    assert!(text(&response).contains("You must enter a valid quantity."));
    let body = format!("food={}&quantity=3", fixture.water);
    let response = fixture.send(post_form(&path, Some(&cookie), &body)).await;
    assert!(text(&response).contains("Food is already in the menu."));
    let body = format!("food={}&quantity=3", fixture.meat);
    let response = fixture.send(post_form(&path, Some(&cookie), &body)).await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), format!("/menu/{}/info", fixture.menu));
}

#[tokio::test]
async fn copying_a_menu() {
    let fixture = Fixture::new().await;
    let cookie = fixture.admin_cookie().await;
    let path = format!("/menu/{}/copy", fixture.menu);

    let response = fixture.send(post_form(&path, Some(&cookie), "")).await;
    assert_eq!(response.status(), 302);
    let copy: i32 = location(&response)
        .trim_start_matches("/menu/")
        .trim_end_matches("/info")
        .parse()
        .unwrap();
    let menu = fixture.db().get_menu(copy).await.unwrap().unwrap();
    assert_eq!(menu.name, "Super-Menu_copy");
    assert!(menu.active);
    let foods = fixture.db().list_composed(copy).await.unwrap();
    assert_eq!(foods.len(), 1);

    let response = fixture.send(post_form(&path, Some(&cookie), "")).await;
    assert_eq!(response.status(), 302);
    let menus = fixture.db().list_active_menus().await.unwrap();
    assert!(menus.iter().any(|menu| menu.name == "Super-Menu_copy2"));
}

#[tokio::test]
async fn editing_menu_components() {
    let fixture = Fixture::new().await;
    let cookie = fixture.admin_cookie().await;
    let update = format!("/menu/{}/{}/update", fixture.menu, fixture.water);
    let remove = format!("/menu/{}/{}/remove", fixture.menu, fixture.water);

    let response = fixture.send(post_form(&update, Some(&cookie), "quantity=5")).await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), format!("/menu/{}/info", fixture.menu));
    let composed = fixture
        .db()
        .get_composed(fixture.menu, fixture.water)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(composed.quantity, 5);

    let response = fixture.send(post_form(&update, Some(&cookie), "quantity=0")).await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("You must enter a valid quantity."));
    let composed = fixture
        .db()
        .get_composed(fixture.menu, fixture.water)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(composed.quantity, 5);

    // Meat was never part of the menu.
    let path = format!("/menu/{}/{}/update", fixture.menu, fixture.meat);
    let response = fixture.send(post_form(&path, Some(&cookie), "quantity=1")).await;
    assert_eq!(response.status(), 404);
    let path = format!("/menu/{}/{}/remove", fixture.menu, fixture.meat);
    let response = fixture.send(post_form(&path, Some(&cookie), "")).await;
    assert_eq!(response.status(), 404);

    let response = fixture.send(post_form(&remove, Some(&cookie), "")).await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), format!("/menu/{}/info", fixture.menu));
    let composed = fixture
        .db()
        .get_composed(fixture.menu, fixture.water)
        .await
        .unwrap();
    assert!(composed.is_none());

    let response = fixture.send(post_form(&remove, Some(&cookie), "")).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn meals_need_a_free_tray() {
    let fixture = Fixture::new().await;
    let cookie = fixture.admin_cookie().await;
    let body = format!(
        "menu={}&user={}&tray={}&information=Lunch",
        fixture.menu, fixture.candidate, fixture.tray
    );

    let response = fixture.send(post_form("/meal/create", Some(&cookie), &body)).await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), "/");
    let tray = fixture.db().get_tray(fixture.tray).await.unwrap().unwrap();
    assert!(tray.in_use);

    let response = fixture.send(post_form("/meal/create", Some(&cookie), &body)).await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("You must select a valid tray."));

    let meal = fixture
        .db()
        .get_ongoing_meal_on_tray(fixture.tray)
        .await
        .unwrap()
        .unwrap();
    let response = fixture.send(get("/", Some(&cookie))).await;
    assert!(text(&response).contains("1 ongoing meal"));

    // The regular user isn't responsible for it.
    let user = fixture.user_cookie().await;
    let path = format!("/meal/{}/finished", meal.id);
    let response = fixture.send(post_form(&path, Some(&user), "")).await;
    assert_eq!(response.status(), 403);

    let response = fixture.send(post_form(&path, Some(&cookie), "")).await;
    assert_eq!(response.status(), 302);
    let tray = fixture.db().get_tray(fixture.tray).await.unwrap().unwrap();
    assert!(!tray.in_use);
    let ended = fixture.db().get_meal(meal.id).await.unwrap().unwrap().ended_at;
    assert!(ended.is_some());

    // Finishing again changes nothing.
    let response = fixture.send(post_form(&path, Some(&cookie), "")).await;
    assert_eq!(response.status(), 302);
    let again = fixture.db().get_meal(meal.id).await.unwrap().unwrap().ended_at;
    assert_eq!(ended, again);
}

#[tokio::test]
async fn deleting_an_ongoing_meal_frees_its_tray() {
    let fixture = Fixture::new().await;
    let cookie = fixture.admin_cookie().await;
    let body = format!(
        "menu={}&user={}&tray={}&information=Supper",
        fixture.menu, fixture.candidate, fixture.tray
    );
    let response = fixture.send(post_form("/meal/create", Some(&cookie), &body)).await;
    assert_eq!(response.status(), 302);
    let meal = fixture
        .db()
        .get_ongoing_meal_on_tray(fixture.tray)
        .await
        .unwrap()
        .unwrap();

    let path = format!("/meal/{}/delete", meal.id);
    let response = fixture.send(post_form(&path, Some(&cookie), "")).await;
    assert_eq!(response.status(), 302);
    assert_eq!(location(&response), "/meal/list");

    let meal = fixture.db().get_meal(meal.id).await.unwrap().unwrap();
    assert!(!meal.active);
    assert!(meal.ended_at.is_some());
    let tray = fixture.db().get_tray(fixture.tray).await.unwrap().unwrap();
    assert!(!tray.in_use);
    let ongoing = fixture
        .db()
        .get_ongoing_meal_on_tray(fixture.tray)
        .await
        .unwrap();
    assert!(ongoing.is_none());

    // The tray can serve again.
    let response = fixture.send(post_form("/meal/create", Some(&cookie), &body)).await;
    assert_eq!(response.status(), 302);
}

#[tokio::test]
async fn tray_heartbeats() {
    let fixture = Fixture::new().await;

    let response = fixture
        .send(post_form("/tray/connect", None, "name=Super-Tray&ip=10.0.0.7"))
        .await;
    assert_eq!(response.status(), 200);
    let tray = fixture.db().get_tray(fixture.tray).await.unwrap().unwrap();
    assert_eq!(tray.ip.as_deref(), Some("10.0.0.7"));
    assert!(tray.online);
    assert!(tray.last_seen.is_some());

    let response = fixture
        .send(post_form("/tray/connect", None, "name=Nobody&ip=10.0.0.8"))
        .await;
    assert_eq!(response.status(), 400);

    let cookie = fixture.admin_cookie().await;
    let response = fixture.send(get("/tray/list", Some(&cookie))).await;
    assert!(text(&response).contains("Online"));
}

#[tokio::test]
async fn tray_uploads() {
    let fixture = Fixture::new().await;
    let files = |data: &'static str, image: &'static str| {
        post_multipart(
            "/tray/data",
            None,
            &[
                Part::Field("name", "Super-Tray"),
                Part::File("data", data, b"weight,42\n"),
                Part::File("image", image, b"\x89PNG"),
            ],
        )
    };

    // Nothing is being served yet.
    let response = fixture.send(files("results.csv", "plate.png")).await;
    assert_eq!(response.status(), 404);

    let cookie = fixture.admin_cookie().await;
    let body = format!(
        "menu={}&user={}&tray={}&information=Dinner",
        fixture.menu, fixture.candidate, fixture.tray
    );
    let response = fixture.send(post_form("/meal/create", Some(&cookie), &body)).await;
    assert_eq!(response.status(), 302);

    let response = fixture.send(files("results.exe", "plate.png")).await;
    assert_eq!(response.status(), 400);
    let response = fixture.send(files("results.csv", "plate.bmp")).await;
    assert_eq!(response.status(), 400);
    let response = fixture
        .send(post_multipart(
            "/tray/data",
            None,
            &[
                Part::Field("name", "Super-Tray"),
                Part::File("data", "results.csv", b"weight,42\n"),
            ],
        ))
        .await;
    assert_eq!(response.status(), 400);
    // A file input left empty arrives with an empty filename.
    let response = fixture.send(files("results.csv", "")).await;
    assert_eq!(response.status(), 400);

    let response = fixture.send(files("results.CSV", "plate.PNG")).await;
    assert_eq!(response.status(), 200);

    let meal = fixture
        .db()
        .get_ongoing_meal_on_tray(fixture.tray)
        .await
        .unwrap()
        .unwrap();
    let path = format!("/meal/{}/download", meal.id);
    let response = fixture.send(get(&path, Some(&cookie))).await;
    assert_eq!(response.status(), 200);
    assert_eq!(&response.body()[..], b"weight,42\n");
    let disposition = response.headers()[CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment"));

    let path = format!("/meal/{}/info", meal.id);
    let response = fixture.send(get(&path, Some(&cookie))).await;
    assert!(text(&response).contains(&format!("/meal/{}/image", meal.id)));

    let tray = fixture.db().get_tray(fixture.tray).await.unwrap().unwrap();
    assert!(tray.last_seen.is_some());
}

#[tokio::test]
async fn users_edit_themselves_but_not_their_permission() {
    let fixture = Fixture::new().await;
    let cookie = fixture.user_cookie().await;
    let person = fixture.user_person.to_string();
    let path = format!("/user/{}/update", fixture.user);

    let response = fixture
        .send(post_multipart(
            &path,
            Some(&cookie),
            &[
                Part::Field("person", &person),
                Part::Field("mail", USER_MAIL),
                Part::Field("password", "new"),
                Part::Field("password2", "other"),
            ],
        ))
        .await;
    assert_eq!(response.status(), 400);
    assert!(text(&response).contains("The passwords must be the same."));

    let response = fixture
        .send(post_multipart(
            &path,
            Some(&cookie),
            &[
                Part::Field("person", &person),
                Part::Field("mail", USER_MAIL),
                Part::Field("password", "new"),
                Part::Field("password2", "new"),
                Part::Field("permission", "1"),
                Part::File("image", "me.png", b"\x89PNG"),
            ],
        ))
        .await;
    assert_eq!(response.status(), 302);

    let user = fixture.db().get_user(fixture.user).await.unwrap().unwrap();
    assert_eq!(user.permission, 2);
    assert_eq!(user.avatar, format!("{}.png", fixture.user));

    // Nor can they move their account to someone else.
    let candidate = fixture.candidate.to_string();
    let response = fixture
        .send(post_multipart(
            &path,
            Some(&cookie),
            &[
                Part::Field("person", &candidate),
                Part::Field("mail", USER_MAIL),
                Part::Field("password", "new"),
                Part::Field("password2", "new"),
            ],
        ))
        .await;
    assert_eq!(response.status(), 302);
    let user = fixture.db().get_user(fixture.user).await.unwrap().unwrap();
    assert_eq!(user.person_id, fixture.user_person);

    let response = fixture
        .send(get(&format!("/uploads/avatars/{}", user.avatar), None))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(&response.body()[..], b"\x89PNG");

    let other = format!("/user/{}/update", fixture.admin);
    let response = fixture.send(get(&other, Some(&cookie))).await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn public_pages() {
    let fixture = Fixture::new().await;

    let response = fixture.send(get("/running", None)).await;
    assert_eq!(response.status(), 200);
    assert_eq!(text(&response), "Server is running");

    let response = fixture.send(get("/static/style.css", None)).await;
    assert_eq!(response.status(), 200);

    let response = fixture
        .send(get("/uploads/avatars/simple_user.png", None))
        .await;
    assert_eq!(response.status(), 200);

    let response = fixture.send(get("/uploads/avatars/..%2Fsecret", None)).await;
    assert_eq!(response.status(), 404);
}
