//! Trays, including the endpoints the trays themselves talk to.

use crate::{
    dal::{FileKind, NewTray, Uploads, DB},
    logic::{
        checked,
        files::{Upload, DATA_EXTENSIONS, IMAGE_EXTENSIONS},
        found, invalid, not_found, parse_id, required,
    },
    schema::{Tray, TrayStatus, Version},
};
use chrono::{Duration, NaiveDateTime, Utc};
use failure::Fallible;
use log::{debug, info};
use serde_derive::{Deserialize, Serialize};

/// The form a tray is created or updated with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TrayForm {
    /// The tray's name.
    pub name: String,

    /// The ID of the tray's hardware version.
    pub version: String,

    /// Free-form information about the tray.
    pub information: String,

    /// Present when the "active" checkbox is checked. Ignored on creation.
    pub active: Option<String>,
}

impl From<&Tray> for TrayForm {
    fn from(tray: &Tray) -> TrayForm {
        TrayForm {
            name: tray.name.clone(),
            version: tray.version_id.to_string(),
            information: tray.information.clone(),
            active: if tray.active {
                Some("1".to_owned())
            } else {
                None
            },
        }
    }
}

impl TrayForm {
    async fn validate(&self, db: &DB, except: Option<i32>) -> Fallible<NewTray> {
        let name = required(&self.name, "You must enter a name.")?;
        let version = required(&self.version, "You must enter a version.")?;
        let information = required(&self.information, "You must enter some information.")?;
        let version_id = parse_id(version, "You must select a valid version.")?;
        match db.get_version(version_id).await? {
            Some(ref version) if version.active => {}
            _ => return invalid("You must select a valid version."),
        }
        if db.tray_name_taken(name.to_owned(), except).await? {
            return invalid(format!("Tray {} is already registered.", name));
        }
        Ok(NewTray {
            name: name.to_owned(),
            version_id,
            information: information.to_owned(),
        })
    }
}

/// The heartbeat a tray sends.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConnectForm {
    /// The tray's name.
    pub name: String,

    /// The address the tray can be reached at.
    pub ip: String,
}

/// Whether a tray reported in recently enough to be considered online.
pub fn reachable(tray: &Tray, now: NaiveDateTime, timeout: Duration) -> bool {
    match tray.last_seen {
        Some(last_seen) => tray.online && now - last_seen <= timeout,
        None => false,
    }
}

/// Lists every tray, with whether it is currently reachable.
pub async fn list(db: &DB, timeout: Duration) -> Fallible<Vec<TrayStatus>> {
    let now = Utc::now().naive_utc();
    let trays = db.list_trays().await?;
    Ok(trays
        .into_iter()
        .map(|(tray, version)| TrayStatus {
            reachable: reachable(&tray, now, timeout),
            tray,
            version,
        })
        .collect())
}

/// Lists the versions a tray can be.
pub async fn versions(db: &DB) -> Fallible<Vec<Version>> {
    db.list_versions().await
}

/// Gets a tray.
pub async fn get(db: &DB, id: i32) -> Fallible<Tray> {
    found(db.get_tray(id).await?, "Tray", id)
}

/// Registers a tray, returning its ID.
pub async fn create(db: &DB, form: &TrayForm) -> Fallible<i32> {
    let tray = form.validate(db, None).await?;
    let id = db.create_tray(tray).await?;
    info!("Registered tray {}", id);
    Ok(id)
}

/// Updates a tray.
pub async fn update(db: &DB, id: i32, form: &TrayForm) -> Fallible<()> {
    let _ = get(db, id).await?;
    let tray = form.validate(db, Some(id)).await?;
    db.update_tray(id, tray, checked(&form.active)).await
}

/// Marks a tray as deleted.
pub async fn delete(db: &DB, id: i32) -> Fallible<()> {
    let _ = get(db, id).await?;
    db.deactivate_tray(id).await
}

/// Records a tray's heartbeat. If the tray doesn't say where it can be reached, the address the
/// request came from is used.
pub async fn connect(db: &DB, form: &ConnectForm, remote: Option<String>) -> Fallible<()> {
    let name = required(&form.name, "You must enter a name.")?;
    let tray = match db.get_tray_by_name(name.to_owned()).await? {
        Some(tray) => tray,
        None => return invalid(format!("Tray {} is not registered.", name)),
    };
    let ip = address(&form.ip, remote);
    debug!("Heartbeat from tray {} at {}", tray.name, ip);
    db.record_heartbeat(tray.id, ip, Utc::now().naive_utc())
        .await
}

/// Stores the results a tray sends for the meal it is serving: a data file and an image. Returns
/// the meal's ID.
pub async fn store_results(
    db: &DB,
    uploads: &Uploads,
    name: &str,
    data: Option<Upload>,
    image: Option<Upload>,
    remote: Option<String>,
) -> Fallible<i32> {
    let (data, data_ext) = match accepted(data, DATA_EXTENSIONS) {
        Some(data) => data,
        None => return invalid("You must send a data file (csv or txt)."),
    };
    let (image, image_ext) = match accepted(image, IMAGE_EXTENSIONS) {
        Some(image) => image,
        None => return invalid("You must send an image (jpeg, jpg, png or gif)."),
    };

    let name = name.trim();
    let tray = match db.get_tray_by_name(name.to_owned()).await? {
        Some(tray) => tray,
        None => return not_found(format!("Tray {} is not registered.", name)),
    };
    let now = Utc::now().naive_utc();
    let ip = address("", remote.or_else(|| tray.ip.clone()));
    db.record_heartbeat(tray.id, ip, now).await?;
    let meal = match db.get_ongoing_meal_on_tray(tray.id).await? {
        Some(meal) => meal,
        None => return not_found(format!("Tray {} isn't serving a meal.", name)),
    };

    let stem = meal.id.to_string();
    uploads
        .remove_any(FileKind::Data, &stem, DATA_EXTENSIONS)
        .await?;
    uploads
        .store(FileKind::Data, &format!("{}.{}", stem, data_ext), data.contents)
        .await?;
    uploads
        .remove_any(FileKind::Data, &stem, IMAGE_EXTENSIONS)
        .await?;
    uploads
        .store(FileKind::Data, &format!("{}.{}", stem, image_ext), image.contents)
        .await?;
    info!("Tray {} sent the results of meal {}", tray.name, meal.id);
    Ok(meal.id)
}

fn accepted(file: Option<Upload>, extensions: &[&str]) -> Option<(Upload, String)> {
    let file = file?;
    let ext = file.extension_in(extensions)?;
    Some((file, ext))
}

fn address(claimed: &str, remote: Option<String>) -> String {
    let claimed = claimed.trim();
    if !claimed.is_empty() {
        claimed.to_owned()
    } else {
        remote.unwrap_or_else(|| "unknown".to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{address, reachable};
    use crate::schema::Tray;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn sample(online: bool, seconds_ago: Option<i64>) -> (Tray, NaiveDateTime) {
        let now = NaiveDate::from_ymd_opt(2019, 10, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let tray = Tray {
            id: 1,
            name: "Super-Tray".to_owned(),
            version_id: 1,
            information: String::new(),
            ip: None,
            online,
            in_use: false,
            active: true,
            last_seen: seconds_ago.map(|s| now - Duration::seconds(s)),
        };
        (tray, now)
    }

    #[test]
    fn fresh_heartbeats_are_reachable() {
        let (tray, now) = sample(true, Some(10));
        assert!(reachable(&tray, now, Duration::seconds(30)));
    }

    #[test]
    fn stale_heartbeats_are_not() {
        let (tray, now) = sample(true, Some(31));
        assert!(!reachable(&tray, now, Duration::seconds(30)));

        let (tray, now) = sample(true, None);
        assert!(!reachable(&tray, now, Duration::seconds(30)));

        let (tray, now) = sample(false, Some(1));
        assert!(!reachable(&tray, now, Duration::seconds(30)));
    }

    #[test]
    fn claimed_address_wins() {
        assert_eq!(address("10.0.0.7", Some("127.0.0.1".to_owned())), "10.0.0.7");
        assert_eq!(address(" ", Some("127.0.0.1".to_owned())), "127.0.0.1");
        assert_eq!(address("", None), "unknown");
    }
}
