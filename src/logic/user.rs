//! User accounts.

use crate::{
    dal::{FileKind, NewUser, Uploads, UserChanges, DB},
    logic::{
        auth::hash_password,
        checked, forbidden, found, invalid, parse_id, required,
        files::{Upload, IMAGE_EXTENSIONS},
    },
    schema::{Me, Permission, User, UserRow},
};
use failure::Fallible;
use log::info;
use serde_derive::{Deserialize, Serialize};

/// The form a user is created or updated with. It arrives as a multipart form, alongside an
/// optional `image` file for the avatar.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserForm {
    /// The ID of the person behind the account.
    pub person: String,

    /// The mail address used to log in.
    pub mail: String,

    /// The password.
    #[serde(skip_serializing)]
    pub password: String,

    /// The password again, to catch typos.
    #[serde(skip_serializing)]
    pub password2: String,

    /// The permission level; `1` for administrators.
    pub permission: String,

    /// Present when the "active" checkbox is checked.
    pub active: Option<String>,
}

impl From<&User> for UserForm {
    fn from(user: &User) -> UserForm {
        UserForm {
            person: user.person_id.to_string(),
            mail: user.mail.clone(),
            password: String::new(),
            password2: String::new(),
            permission: user.permission.to_string(),
            active: if user.active {
                Some("1".to_owned())
            } else {
                None
            },
        }
    }
}

/// The fields of a form that passed validation.
struct Valid {
    person_id: i32,
    mail: String,
    password_hash: String,
}

impl UserForm {
    fn permission(&self) -> Permission {
        Permission::from_level(self.permission.trim().parse().unwrap_or(2))
    }

    async fn validate(&self, db: &DB, except: Option<i32>) -> Fallible<Valid> {
        let person = required(&self.person, "The account should be linked to a person.")?;
        let mail = required(&self.mail, "Mail is required.")?;
        if self.password.is_empty() || self.password2.is_empty() {
            return invalid("You must enter a password.");
        }
        if self.password != self.password2 {
            return invalid("The passwords must be the same.");
        }
        let person_id = parse_id(person, "The account should be linked to a person.")?;
        if db.get_person(person_id).await?.is_none() {
            return invalid(format!("Person id {} doesn't exist.", person_id));
        }
        if db.mail_taken(mail.to_owned(), except).await? {
            return invalid(format!("User {} already registered.", mail));
        }

        Ok(Valid {
            person_id,
            mail: mail.to_owned(),
            password_hash: hash_password(&self.password),
        })
    }
}

/// Lists every user.
pub async fn list(db: &DB) -> Fallible<Vec<UserRow>> {
    let users = db.list_users().await?;
    Ok(users
        .into_iter()
        .map(|(user, name)| UserRow {
            admin: user.permission() == Permission::Administrator,
            user,
            name,
        })
        .collect())
}

/// Gets a user the current user may edit: themselves, or anyone for an administrator.
pub async fn get_editable(db: &DB, me: &Me, id: i32) -> Fallible<User> {
    if !me.admin && me.id != id {
        return forbidden();
    }
    found(db.get_user(id).await?, "User", id)
}

/// Creates a user, returning their ID.
pub async fn create(
    db: &DB,
    uploads: &Uploads,
    form: &UserForm,
    image: Option<Upload>,
) -> Fallible<i32> {
    let valid = form.validate(db, None).await?;
    let permission = form.permission();
    let id = db
        .create_user(NewUser {
            person_id: valid.person_id,
            mail: valid.mail,
            password_hash: valid.password_hash,
            permission: permission.level(),
            avatar: permission.default_avatar().to_owned(),
        })
        .await?;
    if let Some(image) = image {
        let _ = store_avatar(db, uploads, id, &image).await?;
    }
    info!("Created user {}", id);
    Ok(id)
}

/// Updates a user. Only administrators may relink accounts to another person, change permissions or
/// (de)activate accounts.
pub async fn update(
    db: &DB,
    uploads: &Uploads,
    me: &Me,
    id: i32,
    form: &UserForm,
    image: Option<Upload>,
) -> Fallible<()> {
    let user = get_editable(db, me, id).await?;
    let valid = form.validate(db, Some(id)).await?;
    let (person_id, permission, active) = if me.admin {
        (valid.person_id, form.permission(), checked(&form.active))
    } else {
        (user.person_id, user.permission(), user.active)
    };

    db.update_user(
        id,
        UserChanges {
            person_id,
            mail: valid.mail,
            password_hash: valid.password_hash,
            permission: permission.level(),
            active,
        },
    )
    .await?;

    let stored = match image {
        Some(image) => store_avatar(db, uploads, id, &image).await?,
        None => false,
    };
    if !stored && permission != user.permission() && user.avatar == user.permission().default_avatar()
    {
        db.set_avatar(id, permission.default_avatar().to_owned())
            .await?;
    }
    Ok(())
}

/// Marks a user as deleted.
pub async fn delete(db: &DB, me: &Me, id: i32) -> Fallible<()> {
    let _ = get_editable(db, me, id).await?;
    db.deactivate_user(id).await?;
    info!("Deleted user {}", id);
    Ok(())
}

/// Stores an uploaded avatar as `<user id>.<ext>`, if it is an image. Returns whether it was.
async fn store_avatar(db: &DB, uploads: &Uploads, id: i32, image: &Upload) -> Fallible<bool> {
    let ext = match image.extension_in(IMAGE_EXTENSIONS) {
        Some(ext) => ext,
        None => return Ok(false),
    };
    let stem = id.to_string();
    let name = format!("{}.{}", stem, ext);
    uploads
        .remove_any(FileKind::Avatar, &stem, IMAGE_EXTENSIONS)
        .await?;
    uploads
        .store(FileKind::Avatar, &name, image.contents.clone())
        .await?;
    db.set_avatar(id, name).await?;
    Ok(true)
}
