//! Menus, and the foods they are composed of.

use crate::{
    dal::{NewMenu, DB},
    logic::{checked, found, invalid, parse_quantity, required},
    schema::{Composed, ComposedRow, Food, Me, Menu, MenuRow},
};
use failure::Fallible;
use log::info;
use serde_derive::{Deserialize, Serialize};

/// The form a menu is created or updated with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MenuForm {
    /// The menu's name.
    pub name: String,

    /// Free-form information about the menu.
    pub information: String,

    /// Present when the "active" checkbox is checked. Ignored on creation.
    pub active: Option<String>,
}

impl From<&Menu> for MenuForm {
    fn from(menu: &Menu) -> MenuForm {
        MenuForm {
            name: menu.name.clone(),
            information: menu.information.clone(),
            active: if menu.active {
                Some("1".to_owned())
            } else {
                None
            },
        }
    }
}

impl MenuForm {
    async fn validate(&self, db: &DB, except: Option<i32>) -> Fallible<(String, String)> {
        let name = required(&self.name, "You must enter a name.")?;
        let information = required(&self.information, "You must enter some information.")?;
        if db.menu_name_taken(name.to_owned(), except).await? {
            return invalid("This menu already exists.");
        }
        Ok((name.to_owned(), information.to_owned()))
    }
}

/// The form a food is added to a menu with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ComponentForm {
    /// The ID of the food.
    pub food: String,

    /// How much of the food the menu contains.
    pub quantity: String,
}

/// The form the quantity of a food in a menu is changed with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QuantityForm {
    /// How much of the food the menu contains.
    pub quantity: String,
}

/// Lists the menus that haven't been deleted.
pub async fn list(db: &DB) -> Fallible<Vec<MenuRow>> {
    db.list_menu_rows().await
}

/// Gets a menu.
pub async fn get(db: &DB, id: i32) -> Fallible<Menu> {
    found(db.get_menu(id).await?, "Menu", id)
}

/// Gets a menu, along with the foods it is composed of.
pub async fn info(db: &DB, id: i32) -> Fallible<(MenuRow, Vec<ComposedRow>)> {
    let menu = found(db.get_menu_row(id).await?, "Menu", id)?;
    let foods = db.list_composed(id).await?;
    Ok((menu, foods))
}

/// Creates a menu owned by the current user's person, returning its ID.
pub async fn create(db: &DB, me: &Me, form: &MenuForm) -> Fallible<i32> {
    let (name, information) = form.validate(db, None).await?;
    let id = db
        .create_menu(NewMenu {
            name,
            information,
            owner_id: me.person_id,
        })
        .await?;
    info!("{} created menu {}", me.mail, id);
    Ok(id)
}

/// Updates a menu.
pub async fn update(db: &DB, id: i32, form: &MenuForm) -> Fallible<()> {
    let _ = get(db, id).await?;
    let (name, information) = form.validate(db, Some(id)).await?;
    db.update_menu(id, name, information, checked(&form.active))
        .await
}

/// Marks a menu as deleted.
pub async fn delete(db: &DB, id: i32) -> Fallible<()> {
    let _ = get(db, id).await?;
    db.deactivate_menu(id).await
}

/// Copies a menu and its foods into a new menu owned by the current user's person, returning the
/// copy's ID. The copy is named `<name>_copy`, or `<name>_copy2`, `<name>_copy3`, and so on if
/// that is taken.
pub async fn copy(db: &DB, me: &Me, id: i32) -> Fallible<i32> {
    let menu = get(db, id).await?;
    let base = format!("{}_copy", menu.name);
    let mut name = base.clone();
    let mut n = 1;
    while db.menu_name_taken(name.clone(), None).await? {
        n += 1;
        name = format!("{}{}", base, n);
    }

    let copy = db
        .copy_menu(
            id,
            NewMenu {
                name,
                information: menu.information,
                owner_id: me.person_id,
            },
        )
        .await?;
    info!("{} copied menu {} to {}", me.mail, id, copy);
    Ok(copy)
}

/// Lists the foods that could be added to a menu.
pub async fn addable_foods(db: &DB, id: i32) -> Fallible<Vec<Food>> {
    db.list_foods_not_in_menu(id).await
}

/// Adds a food to a menu.
pub async fn add_component(db: &DB, id: i32, form: &ComponentForm) -> Fallible<()> {
    let _ = get(db, id).await?;
    let food = required(&form.food, "You must select a food.")?;
    let quantity = parse_quantity(&form.quantity)?;
    let food = match food.parse::<i32>() {
        Ok(food) => food,
        Err(_) => return invalid("Food does not exist."),
    };
    match db.get_food(food).await? {
        Some(ref food) if food.active => {}
        _ => return invalid("Food does not exist."),
    }
    if db.get_composed(id, food).await?.is_some() {
        return invalid("Food is already in the menu.");
    }
    db.add_composed(id, food, quantity).await
}

/// Gets one food of a menu.
pub async fn get_component(db: &DB, id: i32, food: i32) -> Fallible<Composed> {
    let _ = get(db, id).await?;
    found(db.get_composed(id, food).await?, "Food", food)
}

/// Changes how much of a food a menu contains.
pub async fn update_component(db: &DB, id: i32, food: i32, form: &QuantityForm) -> Fallible<()> {
    let _ = get_component(db, id, food).await?;
    let quantity = parse_quantity(&form.quantity)?;
    db.set_composed_quantity(id, food, quantity).await
}

/// Removes a food from a menu.
pub async fn remove_component(db: &DB, id: i32, food: i32) -> Fallible<()> {
    let _ = get_component(db, id, food).await?;
    db.remove_composed(id, food).await
}
