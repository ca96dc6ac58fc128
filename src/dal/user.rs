use crate::{
    dal::{
        schema::{persons, sessions, users},
        DB,
    },
    schema::User,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{
    dsl::{delete, insert_into, update},
    prelude::*,
};
use failure::Fallible;
use uuid::Uuid;

/// A user to be created. New users are always active.
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    /// The database ID of the person behind the account.
    pub person_id: i32,

    /// The user's mail address.
    pub mail: String,

    /// The user's hashed password.
    pub password_hash: String,

    /// The user's permission level.
    pub permission: i32,

    /// The file name of the user's avatar.
    pub avatar: String,
}

/// The fields of a user an update overwrites. The avatar is managed separately, since it depends
/// on whether a file was uploaded.
#[derive(AsChangeset, Clone, Debug)]
#[diesel(table_name = users)]
pub struct UserChanges {
    /// The database ID of the person behind the account.
    pub person_id: i32,

    /// The user's mail address.
    pub mail: String,

    /// The user's hashed password.
    pub password_hash: String,

    /// The user's permission level.
    pub permission: i32,

    /// Whether the account may log in.
    pub active: bool,
}

impl DB {
    /// Gets every user, along with the name of the person behind them.
    pub async fn list_users(&self) -> Fallible<Vec<(User, String)>> {
        self.query(|conn| {
            users::table
                .inner_join(persons::table)
                .select((users::all_columns, persons::name))
                .order(users::id.asc())
                .load(conn)
        })
        .await
    }

    /// Gets a user by ID.
    pub async fn get_user(&self, id: i32) -> Fallible<Option<User>> {
        self.query(move |conn| users::table.find(id).first(conn).optional())
            .await
    }

    /// Gets a user by mail address.
    pub async fn get_user_by_mail(&self, mail: String) -> Fallible<Option<User>> {
        self.query(move |conn| {
            users::table
                .filter(users::mail.eq(&mail))
                .first(conn)
                .optional()
        })
        .await
    }

    /// Checks whether a mail address belongs to a user other than `except`.
    pub async fn mail_taken(&self, mail: String, except: Option<i32>) -> Fallible<bool> {
        self.query(move |conn| {
            users::table
                .filter(users::mail.eq(&mail))
                .select(users::id)
                .load::<i32>(conn)
                .map(|ids| ids.into_iter().any(|id| Some(id) != except))
        })
        .await
    }

    /// Creates a user, returning their ID.
    pub async fn create_user(&self, user: NewUser) -> Fallible<i32> {
        self.query(move |conn| {
            insert_into(users::table)
                .values(&user)
                .returning(users::id)
                .get_result(conn)
        })
        .await
    }

    /// Overwrites a user's fields.
    pub async fn update_user(&self, id: i32, changes: UserChanges) -> Fallible<()> {
        self.query(move |conn| {
            update(users::table.find(id))
                .set(&changes)
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Sets a user's avatar file name.
    pub async fn set_avatar(&self, id: i32, avatar: String) -> Fallible<()> {
        self.query(move |conn| {
            update(users::table.find(id))
                .set(users::avatar.eq(&avatar))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Marks a user as deleted. Their sessions are dropped too.
    pub async fn deactivate_user(&self, id: i32) -> Fallible<()> {
        self.query(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let _ = update(users::table.find(id))
                    .set(users::active.eq(false))
                    .execute(conn)?;
                let _ = delete(sessions::table.filter(sessions::user_id.eq(id))).execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    /// Creates a session for the given user, returning its token.
    pub async fn create_session(&self, user: i32) -> Fallible<Uuid> {
        self.create_session_at(user, Utc::now().naive_utc()).await
    }

    /// Creates a session for the given user as if it was started at `created`.
    pub async fn create_session_at(&self, user: i32, created: NaiveDateTime) -> Fallible<Uuid> {
        self.query(move |conn| {
            let token = Uuid::new_v4();
            insert_into(sessions::table)
                .values((
                    sessions::id.eq(token.to_string()),
                    sessions::user_id.eq(user),
                    sessions::created.eq(created),
                ))
                .execute(conn)
                .map(|_| token)
        })
        .await
    }

    /// Looks up a session started after `since`, returning the user it belongs to and the name of
    /// the person behind them.
    pub async fn get_session_user(
        &self,
        token: Uuid,
        since: NaiveDateTime,
    ) -> Fallible<Option<(User, String)>> {
        self.query(move |conn| {
            sessions::table
                .inner_join(users::table.inner_join(persons::table))
                .filter(sessions::id.eq(token.to_string()))
                .filter(sessions::created.gt(since))
                .select((users::all_columns, persons::name))
                .first(conn)
                .optional()
        })
        .await
    }

    /// Deletes every session started at or before `before`, returning how many there were.
    pub async fn delete_sessions_before(&self, before: NaiveDateTime) -> Fallible<usize> {
        self.query(move |conn| {
            delete(sessions::table.filter(sessions::created.le(before))).execute(conn)
        })
        .await
    }

    /// Deletes a session.
    pub async fn delete_session(&self, token: Uuid) -> Fallible<()> {
        self.query(move |conn| {
            delete(sessions::table.find(token.to_string()))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }
}
