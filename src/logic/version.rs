//! Tray hardware versions.

use crate::{
    dal::{NewVersion, DB},
    logic::{found, invalid, parse_date, required},
    schema::Version,
};
use failure::Fallible;
use serde_derive::{Deserialize, Serialize};

/// The form a version is created or updated with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VersionForm {
    /// The version's name.
    pub name: String,

    /// When the version was released, as `YYYY-MM-DD`.
    pub release_date: String,
}

impl From<&Version> for VersionForm {
    fn from(version: &Version) -> VersionForm {
        VersionForm {
            name: version.name.clone(),
            release_date: version.release_date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl VersionForm {
    async fn validate(&self, db: &DB, except: Option<i32>) -> Fallible<NewVersion> {
        let name = required(&self.name, "You must enter a name.")?;
        let release_date = required(&self.release_date, "You must enter a release date.")?;
        let release_date = parse_date(release_date, "You must enter a valid date.")?;
        if db.version_name_taken(name.to_owned(), except).await? {
            return invalid("This version already exists.");
        }
        Ok(NewVersion {
            name: name.to_owned(),
            release_date,
        })
    }
}

/// Lists the versions that haven't been deleted.
pub async fn list(db: &DB) -> Fallible<Vec<Version>> {
    db.list_versions().await
}

/// Gets a version.
pub async fn get(db: &DB, id: i32) -> Fallible<Version> {
    found(db.get_version(id).await?, "Version", id)
}

/// Creates a version, returning its ID.
pub async fn create(db: &DB, form: &VersionForm) -> Fallible<i32> {
    let version = form.validate(db, None).await?;
    db.create_version(version).await
}

/// Updates a version.
pub async fn update(db: &DB, id: i32, form: &VersionForm) -> Fallible<()> {
    let _ = get(db, id).await?;
    let version = form.validate(db, Some(id)).await?;
    db.update_version(id, version).await
}

/// Marks a version as deleted.
pub async fn delete(db: &DB, id: i32) -> Fallible<()> {
    let _ = get(db, id).await?;
    db.deactivate_version(id).await
}
