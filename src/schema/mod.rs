//! Types used throughout.
//!
//! > Schema defines the plain old data types that views operate on. Notably, the schema module has
//! > no knowledge of the database, nor any dependencies on any of the rest of the system.
//!
//! The `Queryable` and `QueryableByName` derives are the one exception: they only describe the
//! shape of a row, not where it comes from.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::sql_types::{Bool, Integer, Nullable, Text, Timestamp};
use serde_derive::Serialize;

/// A permission level. Level 1 is an administrator; anything else is a regular user.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Permission {
    /// May create, update and delete everything.
    Administrator,

    /// May look around, report bugs, and finish their own meals.
    User,
}

impl Permission {
    /// Decodes a stored permission level.
    pub fn from_level(level: i32) -> Permission {
        if level == 1 {
            Permission::Administrator
        } else {
            Permission::User
        }
    }

    /// The stored permission level.
    pub fn level(self) -> i32 {
        match self {
            Permission::Administrator => 1,
            Permission::User => 2,
        }
    }

    /// The avatar a user with this permission gets when they haven't uploaded one.
    pub fn default_avatar(self) -> &'static str {
        match self {
            Permission::Administrator => "administrator.png",
            Permission::User => "simple_user.png",
        }
    }
}

/// The logged-in user, as seen by every page.
#[derive(Clone, Debug, Serialize)]
pub struct Me {
    /// The user's database ID.
    pub id: i32,

    /// The database ID of the person behind the account.
    pub person_id: i32,

    /// The person's name.
    pub name: String,

    /// The user's mail address.
    pub mail: String,

    /// Whether the user is an administrator.
    pub admin: bool,

    /// The file name of the user's avatar.
    pub avatar: String,
}

/// A person who can be served meals, or who owns an account.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Person {
    /// The person's database ID.
    pub id: i32,

    /// The person's name.
    pub name: String,

    /// The person's birthdate.
    pub birthdate: NaiveDate,

    /// The person's gender, as free text.
    pub gender: String,

    /// The person's weight.
    pub weight: f64,

    /// Whether the person has not been deleted.
    pub active: bool,
}

/// A user account.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct User {
    /// The user's database ID.
    pub id: i32,

    /// The database ID of the person behind the account.
    pub person_id: i32,

    /// The user's mail address, used to log in.
    pub mail: String,

    /// The user's hashed password.
    #[serde(skip)]
    pub password_hash: String,

    /// The user's stored permission level.
    pub permission: i32,

    /// Whether the account may log in.
    pub active: bool,

    /// The file name of the user's avatar.
    pub avatar: String,
}

impl User {
    /// The user's permission.
    pub fn permission(&self) -> Permission {
        Permission::from_level(self.permission)
    }
}

/// A user, along with the name of the person behind it.
#[derive(Clone, Debug, Serialize)]
pub struct UserRow {
    /// The user.
    #[serde(flatten)]
    pub user: User,

    /// The name of the person behind the account.
    pub name: String,

    /// Whether the user is an administrator.
    pub admin: bool,
}

/// A food category.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Category {
    /// The category's database ID.
    pub id: i32,

    /// The category's name.
    pub name: String,

    /// Whether the category has not been deleted.
    pub active: bool,
}

/// A food item.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Food {
    /// The food's database ID.
    pub id: i32,

    /// The food's name.
    pub name: String,

    /// The database ID of the food's category.
    pub category_id: i32,

    /// Free-form information about the food.
    pub information: String,

    /// The database ID of the person who registered the food.
    pub owner_id: i32,

    /// Whether the food has not been deleted.
    pub active: bool,
}

/// A food with its category and owner resolved, for listings.
#[derive(Clone, Debug, QueryableByName, Serialize)]
pub struct FoodRow {
    /// The food's database ID.
    #[diesel(sql_type = Integer)]
    pub id: i32,

    /// The food's name.
    #[diesel(sql_type = Text)]
    pub name: String,

    /// The name of the food's category.
    #[diesel(sql_type = Text)]
    pub category: String,

    /// Free-form information about the food.
    #[diesel(sql_type = Text)]
    pub information: String,

    /// The name of the person who registered the food.
    #[diesel(sql_type = Text)]
    pub owner: String,
}

/// A menu.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Menu {
    /// The menu's database ID.
    pub id: i32,

    /// The menu's name.
    pub name: String,

    /// Free-form information about the menu.
    pub information: String,

    /// Whether the menu has not been deleted.
    pub active: bool,

    /// The database ID of the person who composed the menu.
    pub owner_id: i32,
}

/// A menu with its owner's name resolved.
#[derive(Clone, Debug, QueryableByName, Serialize)]
pub struct MenuRow {
    /// The menu's database ID.
    #[diesel(sql_type = Integer)]
    pub id: i32,

    /// The menu's name.
    #[diesel(sql_type = Text)]
    pub name: String,

    /// Free-form information about the menu.
    #[diesel(sql_type = Text)]
    pub information: String,

    /// Whether the menu has not been deleted.
    #[diesel(sql_type = Bool)]
    pub active: bool,

    /// The name of the person who composed the menu.
    #[diesel(sql_type = Text)]
    pub owner: String,
}

/// One food in a menu.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Composed {
    /// The database ID of the menu.
    pub menu_id: i32,

    /// The database ID of the food.
    pub food_id: i32,

    /// How much of the food the menu contains.
    pub quantity: i32,
}

/// One food in a menu, with the food resolved.
#[derive(Clone, Debug, QueryableByName, Serialize)]
pub struct ComposedRow {
    /// The database ID of the food.
    #[diesel(sql_type = Integer)]
    pub food_id: i32,

    /// The food's name.
    #[diesel(sql_type = Text)]
    pub name: String,

    /// The name of the food's category.
    #[diesel(sql_type = Text)]
    pub category: String,

    /// Free-form information about the food.
    #[diesel(sql_type = Text)]
    pub information: String,

    /// How much of the food the menu contains.
    #[diesel(sql_type = Integer)]
    pub quantity: i32,
}

/// A tray hardware version.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Version {
    /// The version's database ID.
    pub id: i32,

    /// The version's name.
    pub name: String,

    /// When the version was released.
    pub release_date: NaiveDate,

    /// Whether the version has not been deleted.
    pub active: bool,
}

/// A tray, the device serving a meal.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Tray {
    /// The tray's database ID.
    pub id: i32,

    /// The tray's name. Trays identify themselves by it when reporting in.
    pub name: String,

    /// The database ID of the tray's hardware version.
    pub version_id: i32,

    /// Free-form information about the tray.
    pub information: String,

    /// The address the tray last reported from.
    pub ip: Option<String>,

    /// Whether the tray has ever reported in.
    pub online: bool,

    /// Whether the tray is serving a meal.
    pub in_use: bool,

    /// Whether the tray has not been deleted.
    pub active: bool,

    /// When the tray last reported in.
    #[serde(serialize_with = "stamp::serialize_opt")]
    pub last_seen: Option<NaiveDateTime>,
}

/// A tray, along with its version's name and whether it is currently reachable.
#[derive(Clone, Debug, Serialize)]
pub struct TrayStatus {
    /// The tray.
    #[serde(flatten)]
    pub tray: Tray,

    /// The name of the tray's hardware version.
    pub version: String,

    /// Whether the tray reported in recently enough to be considered online.
    pub reachable: bool,
}

/// A meal.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Meal {
    /// The meal's database ID.
    pub id: i32,

    /// The database ID of the tray serving the meal.
    pub tray_id: i32,

    /// The database ID of the menu being served.
    pub menu_id: i32,

    /// The database ID of the user who started the meal.
    pub responsible_id: i32,

    /// The database ID of the person being served.
    pub candidate_id: i32,

    /// Free-form information about the meal.
    pub information: String,

    /// When the meal started.
    #[serde(serialize_with = "stamp::serialize")]
    pub started_at: NaiveDateTime,

    /// When the meal ended, if it has.
    #[serde(serialize_with = "stamp::serialize_opt")]
    pub ended_at: Option<NaiveDateTime>,

    /// Whether the meal has not been deleted.
    pub active: bool,
}

/// A meal with everything it refers to resolved, for listings.
#[derive(Clone, Debug, QueryableByName, Serialize)]
pub struct MealRow {
    /// The meal's database ID.
    #[diesel(sql_type = Integer)]
    pub id: i32,

    /// The database ID of the person being served.
    #[diesel(sql_type = Integer)]
    pub candidate_id: i32,

    /// The name of the person being served.
    #[diesel(sql_type = Text)]
    pub candidate: String,

    /// The database ID of the menu being served.
    #[diesel(sql_type = Integer)]
    pub menu_id: i32,

    /// The name of the menu being served.
    #[diesel(sql_type = Text)]
    pub menu: String,

    /// Information about the menu being served.
    #[diesel(sql_type = Text)]
    pub menu_information: String,

    /// The name of the tray serving the meal.
    #[diesel(sql_type = Text)]
    pub tray: String,

    /// The database ID of the user who started the meal.
    #[diesel(sql_type = Integer)]
    pub responsible_id: i32,

    /// The name of the person who started the meal.
    #[diesel(sql_type = Text)]
    pub responsible: String,

    /// Free-form information about the meal.
    #[diesel(sql_type = Text)]
    pub information: String,

    /// When the meal started.
    #[diesel(sql_type = Timestamp)]
    #[serde(serialize_with = "stamp::serialize")]
    pub started_at: NaiveDateTime,

    /// When the meal ended, if it has.
    #[diesel(sql_type = Nullable<Timestamp>)]
    #[serde(serialize_with = "stamp::serialize_opt")]
    pub ended_at: Option<NaiveDateTime>,

    /// Whether the meal has not been deleted.
    #[diesel(sql_type = Bool)]
    pub active: bool,
}

/// A bug report or suggestion.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Bug {
    /// The bug's database ID.
    pub id: i32,

    /// The bug's title.
    pub title: String,

    /// What the bug is about.
    pub information: String,

    /// When the bug was reported.
    pub reported_on: NaiveDate,

    /// Whether the bug has been dealt with.
    pub corrected: bool,
}

/// Timestamps are shown to humans at second precision.
mod stamp {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(stamp: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&stamp.format(FORMAT))
    }

    pub fn serialize_opt<S: Serializer>(
        stamp: &Option<NaiveDateTime>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match stamp {
            Some(stamp) => s.collect_str(&stamp.format(FORMAT)),
            None => s.serialize_none(),
        }
    }
}
