//! Food items.

use crate::{
    dal::{NewFood, DB},
    logic::{found, invalid, parse_id, required},
    schema::{Food, FoodRow, Me},
};
use failure::Fallible;
use log::info;
use serde_derive::{Deserialize, Serialize};

/// The form a food is created or updated with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FoodForm {
    /// The food's name.
    pub name: String,

    /// The ID of the food's category.
    pub category: String,

    /// Free-form information about the food.
    pub information: String,
}

impl From<&Food> for FoodForm {
    fn from(food: &Food) -> FoodForm {
        FoodForm {
            name: food.name.clone(),
            category: food.category_id.to_string(),
            information: food.information.clone(),
        }
    }
}

impl FoodForm {
    async fn validate(&self, db: &DB, except: Option<i32>) -> Fallible<(String, i32, String)> {
        let name = required(&self.name, "You must enter a name.")?;
        let category = required(&self.category, "You must enter a category.")?;
        let information = required(&self.information, "You must enter some information.")?;
        let category = parse_id(category, "You must select a valid category.")?;
        match db.get_category(category).await? {
            Some(ref category) if category.active => {}
            _ => return invalid("You must select a valid category."),
        }
        if db.food_name_taken(name.to_owned(), except).await? {
            return invalid("This food already exists.");
        }
        Ok((name.to_owned(), category, information.to_owned()))
    }
}

/// Lists the foods that haven't been deleted.
pub async fn list(db: &DB) -> Fallible<Vec<FoodRow>> {
    db.list_food_rows().await
}

/// Gets a food.
pub async fn get(db: &DB, id: i32) -> Fallible<Food> {
    found(db.get_food(id).await?, "Food", id)
}

/// Creates a food owned by the current user's person, returning its ID.
pub async fn create(db: &DB, me: &Me, form: &FoodForm) -> Fallible<i32> {
    let (name, category_id, information) = form.validate(db, None).await?;
    let id = db
        .create_food(NewFood {
            name,
            category_id,
            information,
            owner_id: me.person_id,
        })
        .await?;
    info!("{} created food {}", me.mail, id);
    Ok(id)
}

/// Updates a food. Its owner stays the same.
pub async fn update(db: &DB, id: i32, form: &FoodForm) -> Fallible<()> {
    let _ = get(db, id).await?;
    let (name, category, information) = form.validate(db, Some(id)).await?;
    db.update_food(id, name, category, information).await
}

/// Marks a food as deleted.
pub async fn delete(db: &DB, id: i32) -> Fallible<()> {
    let _ = get(db, id).await?;
    db.deactivate_food(id).await
}
