//! Bug reports and suggestions.

use crate::{
    dal::DB,
    logic::{found, invalid, required},
    schema::{Bug, Me},
};
use chrono::Local;
use failure::Fallible;
use log::info;
use serde_derive::{Deserialize, Serialize};

/// The form a bug is reported with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BugForm {
    /// A short title.
    pub title: String,

    /// What the bug is about.
    pub information: String,
}

/// Lists the bugs that haven't been corrected.
pub async fn list(db: &DB) -> Fallible<Vec<Bug>> {
    db.list_open_bugs().await
}

/// Reports a bug, dated today, returning its ID.
pub async fn create(db: &DB, me: &Me, form: &BugForm) -> Fallible<i32> {
    let title = required(&form.title, "You must enter a title.")?;
    let information = required(&form.information, "You must enter some information.")?;
    if db.bug_title_taken(title.to_owned()).await? {
        return invalid("This title already exists.");
    }

    let id = db
        .create_bug(
            title.to_owned(),
            information.to_owned(),
            Local::now().date_naive(),
        )
        .await?;
    info!("{} reported bug {}", me.mail, id);
    Ok(id)
}

/// Marks a bug as corrected, which takes it off the list.
pub async fn delete(db: &DB, id: i32) -> Fallible<()> {
    let _ = found(db.get_bug(id).await?, "Bug", id)?;
    db.correct_bug(id).await
}
