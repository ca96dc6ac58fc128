//! Bindings to the database.
//!
//! > **DAL**, for lack of a better term (borrowing this one from "data access layer" since I don't
//! > want to use "model"), is the only module that does any talking to the database, or any other
//! > IO or interaction with other kinds of externalized state for that matter.
//!
//! Queries are grouped by the table they mostly touch; each submodule adds its own `impl DB`
//! block.

mod bug;
mod catalog;
mod meal;
mod person;
#[allow(unused_import_braces)]
mod schema;
mod tray;
mod uploads;
mod user;

pub use crate::dal::{
    catalog::{NewFood, NewMenu},
    meal::{MealChanges, NewMeal},
    person::NewPerson,
    tray::{NewTray, NewVersion},
    uploads::{FileKind, Uploads},
    user::{NewUser, UserChanges},
};
use crate::util::blocking;
use diesel::{
    connection::SimpleConnection,
    r2d2::{self, ConnectionManager, CustomizeConnection, Pool},
    sqlite::SqliteConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use failure::{format_err, Error, Fallible};
use log::info;
use std::sync::Arc;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// A pool of connections to the database.
#[allow(missing_debug_implementations)]
#[derive(Clone)]
pub struct DB {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl DB {
    /// Connects to the database with at the given URL (for SQLite, a path), running any pending
    /// migrations.
    pub fn connect(database_url: &str, pool_size: u32) -> Fallible<DB> {
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_customizer(Box::new(ConnectionOptions))
            .build(ConnectionManager::new(database_url))?;
        let mut pooled = pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| format_err!("Couldn't run migrations: {}", err))?;
        if !applied.is_empty() {
            info!("Applied {} migration(s)", applied.len());
        }
        Ok(DB {
            pool: Arc::new(pool),
        })
    }

    /// Performs a query on the blocking thread pool. Diesel doesn't support async, and SQLite
    /// only exposes a synchronous interface anyway, so each query closure gets a connection from
    /// the pool and runs to completion on a thread where blocking is fine.
    async fn query<E, F, T>(&self, func: F) -> Fallible<T>
    where
        E: Into<Error>,
        F: 'static + Send + FnOnce(&mut SqliteConnection) -> Result<T, E>,
        T: 'static + Send,
    {
        let pool = self.pool.clone();
        blocking(move || {
            let mut conn = pool.get()?;
            func(&mut *conn).map_err(Into::into)
        })
        .await
    }
}

/// Per-connection settings SQLite doesn't persist in the database file.
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}
