//! Food categories.

use crate::{
    dal::DB,
    logic::{found, invalid, required},
    schema::Category,
};
use failure::Fallible;
use serde_derive::{Deserialize, Serialize};

/// The form a category is created or renamed with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CategoryForm {
    /// The category's name.
    pub name: String,
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> CategoryForm {
        CategoryForm {
            name: category.name.clone(),
        }
    }
}

impl CategoryForm {
    async fn validate(&self, db: &DB, except: Option<i32>) -> Fallible<String> {
        let name = required(&self.name, "You must enter a name.")?;
        if db.category_name_taken(name.to_owned(), except).await? {
            return invalid("This category already exists.");
        }
        Ok(name.to_owned())
    }
}

/// Lists the categories that haven't been deleted.
pub async fn list(db: &DB) -> Fallible<Vec<Category>> {
    db.list_categories().await
}

/// Gets a category.
pub async fn get(db: &DB, id: i32) -> Fallible<Category> {
    found(db.get_category(id).await?, "Category", id)
}

/// Creates a category, returning its ID.
pub async fn create(db: &DB, form: &CategoryForm) -> Fallible<i32> {
    let name = form.validate(db, None).await?;
    db.create_category(name).await
}

/// Renames a category.
pub async fn update(db: &DB, id: i32, form: &CategoryForm) -> Fallible<()> {
    let _ = get(db, id).await?;
    let name = form.validate(db, Some(id)).await?;
    db.rename_category(id, name).await
}

/// Marks a category as deleted.
pub async fn delete(db: &DB, id: i32) -> Fallible<()> {
    let _ = get(db, id).await?;
    db.deactivate_category(id).await
}
