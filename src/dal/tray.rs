//! Trays and their hardware versions.

use crate::{
    dal::{
        schema::{trays, versions},
        DB,
    },
    schema::{Tray, Version},
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::{
    dsl::{insert_into, update},
    prelude::*,
};
use failure::Fallible;

/// The fields of a tray an administrator writes. New trays are always active, offline, and not
/// in use.
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = trays)]
pub struct NewTray {
    /// The tray's name.
    pub name: String,

    /// The database ID of the tray's hardware version.
    pub version_id: i32,

    /// Free-form information about the tray.
    pub information: String,
}

/// The fields of a version an administrator writes.
#[derive(AsChangeset, Clone, Debug, Insertable)]
#[diesel(table_name = versions)]
pub struct NewVersion {
    /// The version's name.
    pub name: String,

    /// When the version was released.
    pub release_date: NaiveDate,
}

impl DB {
    /// Gets every tray, along with the name of its version.
    pub async fn list_trays(&self) -> Fallible<Vec<(Tray, String)>> {
        self.query(|conn| {
            trays::table
                .inner_join(versions::table)
                .select((trays::all_columns, versions::name))
                .order(trays::id.asc())
                .load(conn)
        })
        .await
    }

    /// Gets the trays a meal could be started on: active, and not in use.
    pub async fn list_free_trays(&self) -> Fallible<Vec<Tray>> {
        self.query(|conn| {
            trays::table
                .filter(trays::active.eq(true))
                .filter(trays::in_use.eq(false))
                .order(trays::name.asc())
                .load(conn)
        })
        .await
    }

    /// Gets a tray by ID.
    pub async fn get_tray(&self, id: i32) -> Fallible<Option<Tray>> {
        self.query(move |conn| trays::table.find(id).first(conn).optional())
            .await
    }

    /// Gets a tray by name.
    pub async fn get_tray_by_name(&self, name: String) -> Fallible<Option<Tray>> {
        self.query(move |conn| {
            trays::table
                .filter(trays::name.eq(&name))
                .first(conn)
                .optional()
        })
        .await
    }

    /// Checks whether a tray other than `except` has the given name. Deleted trays count, since
    /// trays report in by name.
    pub async fn tray_name_taken(&self, name: String, except: Option<i32>) -> Fallible<bool> {
        self.query(move |conn| {
            trays::table
                .filter(trays::name.eq(&name))
                .select(trays::id)
                .load::<i32>(conn)
                .map(|ids| ids.into_iter().any(|id| Some(id) != except))
        })
        .await
    }

    /// Creates a tray, returning its ID.
    pub async fn create_tray(&self, tray: NewTray) -> Fallible<i32> {
        self.query(move |conn| {
            insert_into(trays::table)
                .values(&tray)
                .returning(trays::id)
                .get_result(conn)
        })
        .await
    }

    /// Overwrites a tray's administrative fields.
    pub async fn update_tray(&self, id: i32, tray: NewTray, active: bool) -> Fallible<()> {
        self.query(move |conn| {
            update(trays::table.find(id))
                .set((
                    trays::name.eq(&tray.name),
                    trays::version_id.eq(tray.version_id),
                    trays::information.eq(&tray.information),
                    trays::active.eq(active),
                ))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Marks a tray as deleted.
    pub async fn deactivate_tray(&self, id: i32) -> Fallible<()> {
        self.query(move |conn| {
            update(trays::table.find(id))
                .set(trays::active.eq(false))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Records that a tray reported in from the given address.
    pub async fn record_heartbeat(&self, id: i32, ip: String, at: NaiveDateTime) -> Fallible<()> {
        self.query(move |conn| {
            update(trays::table.find(id))
                .set((
                    trays::ip.eq(Some(ip)),
                    trays::online.eq(true),
                    trays::last_seen.eq(Some(at)),
                ))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Gets every version that hasn't been deleted.
    pub async fn list_versions(&self) -> Fallible<Vec<Version>> {
        self.query(|conn| {
            versions::table
                .filter(versions::active.eq(true))
                .order(versions::id.asc())
                .load(conn)
        })
        .await
    }

    /// Gets a version by ID.
    pub async fn get_version(&self, id: i32) -> Fallible<Option<Version>> {
        self.query(move |conn| versions::table.find(id).first(conn).optional())
            .await
    }

    /// Checks whether an active version other than `except` has the given name.
    pub async fn version_name_taken(&self, name: String, except: Option<i32>) -> Fallible<bool> {
        self.query(move |conn| {
            versions::table
                .filter(versions::name.eq(&name))
                .filter(versions::active.eq(true))
                .select(versions::id)
                .load::<i32>(conn)
                .map(|ids| ids.into_iter().any(|id| Some(id) != except))
        })
        .await
    }

    /// Creates a version, returning its ID.
    pub async fn create_version(&self, version: NewVersion) -> Fallible<i32> {
        self.query(move |conn| {
            insert_into(versions::table)
                .values(&version)
                .returning(versions::id)
                .get_result(conn)
        })
        .await
    }

    /// Overwrites a version's fields.
    pub async fn update_version(&self, id: i32, version: NewVersion) -> Fallible<()> {
        self.query(move |conn| {
            update(versions::table.find(id))
                .set(&version)
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Marks a version as deleted.
    pub async fn deactivate_version(&self, id: i32) -> Fallible<()> {
        self.query(move |conn| {
            update(versions::table.find(id))
                .set(versions::active.eq(false))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }
}
