//! Meals: a person served a menu on a tray.

use crate::{
    dal::{FileKind, MealChanges, NewMeal, Uploads, DB},
    logic::{
        files::{DATA_EXTENSIONS, IMAGE_EXTENSIONS},
        forbidden, found, invalid, not_found, required,
    },
    schema::{Me, Meal, MealRow, Menu, Person, Tray},
};
use chrono::Utc;
use failure::Fallible;
use log::info;
use serde_derive::{Deserialize, Serialize};

/// The form a meal is started with. On update, the tray is ignored.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MealForm {
    /// The ID of the menu to serve.
    pub menu: String,

    /// The ID of the person to serve.
    pub user: String,

    /// The ID of the tray to serve on.
    pub tray: String,

    /// Free-form information about the meal.
    pub information: String,
}

impl From<&Meal> for MealForm {
    fn from(meal: &Meal) -> MealForm {
        MealForm {
            menu: meal.menu_id.to_string(),
            user: meal.candidate_id.to_string(),
            tray: meal.tray_id.to_string(),
            information: meal.information.clone(),
        }
    }
}

/// What a meal can be made of.
#[derive(Clone, Debug, Serialize)]
pub struct Choices {
    /// The active menus.
    pub menus: Vec<Menu>,

    /// The active persons.
    pub persons: Vec<Person>,

    /// The trays that are active and not in use.
    pub trays: Vec<Tray>,
}

/// A meal, along with the names of the files its tray sent back.
#[derive(Clone, Debug, Serialize)]
pub struct MealInfo {
    /// The meal.
    pub meal: MealRow,

    /// The stored data file, if any.
    pub data: Option<String>,

    /// The stored image, if any.
    pub image: Option<String>,
}

/// Parses a selected ID, turning anything that isn't one into a "valid" error.
fn selected(value: &str, msg: &str) -> Fallible<i32> {
    value.parse().or_else(|_| invalid(msg))
}

async fn valid_menu(db: &DB, menu: &str) -> Fallible<i32> {
    let msg = "You must select a valid menu.";
    let id = selected(menu, msg)?;
    match db.get_menu(id).await? {
        Some(ref menu) if menu.active => Ok(id),
        _ => invalid(msg),
    }
}

async fn valid_person(db: &DB, person: &str) -> Fallible<i32> {
    let msg = "You must select a valid user.";
    let id = selected(person, msg)?;
    match db.get_person(id).await? {
        Some(ref person) if person.active => Ok(id),
        _ => invalid(msg),
    }
}

async fn valid_tray(db: &DB, tray: &str) -> Fallible<i32> {
    let msg = "You must select a valid tray.";
    let id = selected(tray, msg)?;
    match db.get_tray(id).await? {
        Some(ref tray) if tray.active && !tray.in_use => Ok(id),
        _ => invalid(msg),
    }
}

/// Lists the meals that haven't been deleted.
pub async fn list(db: &DB) -> Fallible<Vec<MealRow>> {
    db.list_meal_rows().await
}

/// Lists the meals being served right now.
pub async fn ongoing(db: &DB) -> Fallible<Vec<MealRow>> {
    db.list_ongoing_meal_rows().await
}

/// Counts the meals being served right now.
pub async fn count_ongoing(db: &DB) -> Fallible<i64> {
    db.count_ongoing_meals().await
}

/// Gets what a new meal can be made of.
pub async fn choices(db: &DB) -> Fallible<Choices> {
    Ok(Choices {
        menus: db.list_active_menus().await?,
        persons: db.list_active_persons().await?,
        trays: db.list_free_trays().await?,
    })
}

/// Gets a meal.
pub async fn get(db: &DB, id: i32) -> Fallible<Meal> {
    found(db.get_meal(id).await?, "Meal", id)
}

/// Gets a meal with everything it refers to, and the files its tray sent back.
pub async fn info(db: &DB, uploads: &Uploads, id: i32) -> Fallible<MealInfo> {
    let meal = found(db.get_meal_row(id).await?, "Meal", id)?;
    let stem = id.to_string();
    let data = uploads
        .find_any(FileKind::Data, &stem, DATA_EXTENSIONS)
        .await?;
    let image = uploads
        .find_any(FileKind::Data, &stem, IMAGE_EXTENSIONS)
        .await?;
    Ok(MealInfo { meal, data, image })
}

/// Starts a meal on a free tray, with the current user responsible for it. Returns the meal's ID.
pub async fn create(db: &DB, me: &Me, form: &MealForm) -> Fallible<i32> {
    let menu = required(&form.menu, "You must select a menu.")?;
    let person = required(&form.user, "You must select a user.")?;
    let tray = required(&form.tray, "You must select a tray.")?;
    let information = required(&form.information, "You must enter some information.")?;
    let menu_id = valid_menu(db, menu).await?;
    let candidate_id = valid_person(db, person).await?;
    let tray_id = valid_tray(db, tray).await?;

    let id = db
        .start_meal(NewMeal {
            tray_id,
            menu_id,
            responsible_id: me.id,
            candidate_id,
            information: information.to_owned(),
            started_at: Utc::now().naive_utc(),
        })
        .await?;
    info!("{} started meal {} on tray {}", me.mail, id, tray_id);
    Ok(id)
}

/// Changes the menu, person or information of a meal.
pub async fn update(db: &DB, id: i32, form: &MealForm) -> Fallible<()> {
    let _ = get(db, id).await?;
    let menu = required(&form.menu, "You must select a menu.")?;
    let person = required(&form.user, "You must select a user.")?;
    let information = required(&form.information, "You must enter some information.")?;
    let menu_id = valid_menu(db, menu).await?;
    let candidate_id = valid_person(db, person).await?;

    db.update_meal(
        id,
        MealChanges {
            menu_id,
            candidate_id,
            information: information.to_owned(),
        },
    )
    .await
}

/// Ends a meal, releasing its tray. Only the user responsible for the meal or an administrator
/// may do so. Ending a meal that already ended does nothing.
pub async fn finish(db: &DB, me: &Me, id: i32) -> Fallible<()> {
    let meal = db.get_meal(id).await?;
    let responsible = meal.as_ref().map(|meal| meal.responsible_id);
    if !me.admin && responsible != Some(me.id) {
        return forbidden();
    }
    let meal = found(meal, "Meal", id)?;
    if meal.ended_at.is_some() {
        return Ok(());
    }

    db.finish_meal(id, Utc::now().naive_utc()).await?;
    info!("{} finished meal {}", me.mail, id);
    Ok(())
}

/// Marks a meal as deleted, ending it first if it is ongoing.
pub async fn delete(db: &DB, id: i32) -> Fallible<()> {
    let _ = get(db, id).await?;
    db.deactivate_meal(id, Utc::now().naive_utc()).await?;
    info!("Deleted meal {}", id);
    Ok(())
}

/// Reads the data file a tray sent for a meal, returning its name and contents.
pub async fn data_file(db: &DB, uploads: &Uploads, id: i32) -> Fallible<(String, Vec<u8>)> {
    stored_file(db, uploads, id, DATA_EXTENSIONS, "data file").await
}

/// Reads the image a tray sent for a meal, returning its name and contents.
pub async fn image_file(db: &DB, uploads: &Uploads, id: i32) -> Fallible<(String, Vec<u8>)> {
    stored_file(db, uploads, id, IMAGE_EXTENSIONS, "image").await
}

async fn stored_file(
    db: &DB,
    uploads: &Uploads,
    id: i32,
    extensions: &[&str],
    what: &str,
) -> Fallible<(String, Vec<u8>)> {
    let _ = get(db, id).await?;
    match uploads
        .load_any(FileKind::Data, &id.to_string(), extensions)
        .await?
    {
        Some(file) => Ok(file),
        None => not_found(format!("Meal id {} has no {}.", id, what)),
    }
}
