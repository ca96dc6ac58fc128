//! Authentication and authorization-related logic.

use crate::{
    dal::DB,
    logic::invalid,
    schema::{Me, Permission, User},
};
use chrono::{Duration, NaiveDateTime, Utc};
use failure::Fallible;
use log::{debug, info};
use serde_derive::{Deserialize, Serialize};
use rand::{distributions::Alphanumeric, Rng};
use sha2::Sha256;
use uuid::Uuid;

/// How many rounds of PBKDF2 new password hashes use.
pub const ITERATIONS: u32 = 150_000;

const SALT_LENGTH: usize = 16;

/// How many days a session lasts after logging in.
pub const SESSION_DAYS: i64 = 30;

/// The earliest a session still in use could have started.
fn session_cutoff() -> NaiveDateTime {
    Utc::now().naive_utc() - Duration::days(SESSION_DAYS)
}

/// The login form.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    /// The mail address of the account.
    pub mail: String,

    /// The account's password.
    #[serde(skip_serializing)]
    pub password: String,
}

/// Hashes a password with a fresh random salt, in werkzeug's
/// `pbkdf2:sha256:<iterations>$<salt>$<hash>` format.
pub fn hash_password(password: &str) -> String {
    hash_password_with(password, ITERATIONS)
}

/// Hashes a password like `hash_password`, with the given number of rounds.
pub fn hash_password_with(password: &str, iterations: u32) -> String {
    let salt = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect::<String>();
    let hash = pbkdf2(password, &salt, iterations);
    format!("pbkdf2:sha256:{}${}${}", iterations, salt, hex::encode(hash))
}

/// Checks a password against a werkzeug PBKDF2 hash. A method without a round count uses
/// `ITERATIONS`. Malformed hashes and other methods never match.
pub fn verify_password(hash: &str, password: &str) -> bool {
    let mut parts = hash.splitn(3, '$');
    let (method, salt, expected) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(salt), Some(expected)) => (method, salt, expected),
        _ => return false,
    };
    let iterations = match method.split(':').collect::<Vec<_>>().as_slice() {
        ["pbkdf2"] | ["pbkdf2", "sha256"] => ITERATIONS,
        ["pbkdf2", "sha256", iterations] => match iterations.parse::<u32>() {
            Ok(iterations) if iterations > 0 => iterations,
            _ => return false,
        },
        _ => return false,
    };
    let expected = match hex::decode(expected) {
        Ok(expected) => expected,
        Err(_) => return false,
    };

    let actual = pbkdf2(password, salt, iterations);
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected.iter())
            .fold(0, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn pbkdf2(password: &str, salt: &str, iterations: u32) -> [u8; 32] {
    let mut hash = [0; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut hash);
    hash
}

/// Builds the logged-in user from their account and the name of the person behind it.
pub fn me(user: User, name: String) -> Me {
    Me {
        admin: user.permission() == Permission::Administrator,
        id: user.id,
        person_id: user.person_id,
        name,
        mail: user.mail,
        avatar: user.avatar,
    }
}

/// Returns the user authenticated by the given session token, if any. Tokens that don't parse,
/// don't name a session, name an expired one, or belong to a deactivated user authenticate nobody.
pub async fn authed_user(db: &DB, token: &str) -> Fallible<Option<Me>> {
    let token = match token.parse::<Uuid>() {
        Ok(token) => token,
        Err(_) => return Ok(None),
    };
    let user = db.get_session_user(token, session_cutoff()).await?;
    Ok(user
        .filter(|(user, _)| user.active)
        .map(|(user, name)| me(user, name)))
}

/// Checks a user's credentials, returning the token of a new session for them.
pub async fn login(db: &DB, form: &LoginForm) -> Fallible<Uuid> {
    let user = match db.get_user_by_mail(form.mail.trim().to_owned()).await? {
        Some(user) => user,
        None => return invalid("Incorrect username."),
    };
    if !verify_password(&user.password_hash, &form.password) {
        return invalid("Incorrect password.");
    }
    if !user.active {
        return invalid("Account deactivated.");
    }

    let expired = db.delete_sessions_before(session_cutoff()).await?;
    if expired > 0 {
        debug!("Purged {} expired sessions", expired);
    }
    let token = db.create_session(user.id).await?;
    info!("{} logged in", user.mail);
    Ok(token)
}

/// Ends the session with the given token. Unknown tokens are ignored.
pub async fn logout(db: &DB, token: &str) -> Fallible<()> {
    match token.parse::<Uuid>() {
        Ok(token) => db.delete_session(token).await,
        Err(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{hash_password, hash_password_with, verify_password};

    #[test]
    fn hashes_verify() {
        let hash = hash_password("hunter2");
        assert!(hash.starts_with("pbkdf2:sha256:150000$"));
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));

        let hash = hash_password_with("hunter2", 1000);
        assert!(hash.starts_with("pbkdf2:sha256:1000$"));
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, ""));
    }

    #[test]
    fn werkzeug_hashes_verify() {
        let hash = "pbkdf2:sha256:1000$Mc9tH3ZbrX0XYEwq$\
                    acad96fe38dc027f8e1c966ac3dfffd9fbb5c6e47bbb9b1a3d5e778bf3c1ebab";
        assert!(verify_password(hash, "lsg"));
        assert!(!verify_password(hash, "LSG"));
    }

    #[test]
    fn salts_differ() {
        let hash = hash_password_with("admin", 1000);
        let salt = hash.split('$').nth(1).unwrap();
        assert_eq!(salt.len(), 16);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(hash, hash_password_with("admin", 1000));
    }

    #[test]
    fn malformed_hashes_never_match() {
        assert!(!verify_password("", ""));
        assert!(!verify_password("admin", "admin"));
        assert!(!verify_password("pbkdf2:sha256:0$salt$00", ""));
        assert!(!verify_password("pbkdf2:sha256:1$salt$zz", ""));
        assert!(!verify_password("pbkdf2:md5:1$salt$00", ""));
        assert!(!verify_password("sha256$1$00$00", ""));
    }
}
