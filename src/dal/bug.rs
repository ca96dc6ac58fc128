use crate::{
    dal::{schema::bugs, DB},
    schema::Bug,
};
use chrono::NaiveDate;
use diesel::{
    dsl::{insert_into, update},
    prelude::*,
};
use failure::Fallible;

impl DB {
    /// Gets the bugs that haven't been corrected yet.
    pub async fn list_open_bugs(&self) -> Fallible<Vec<Bug>> {
        self.query(|conn| {
            bugs::table
                .filter(bugs::corrected.eq(false))
                .order(bugs::id.asc())
                .load(conn)
        })
        .await
    }

    /// Gets a bug by ID.
    pub async fn get_bug(&self, id: i32) -> Fallible<Option<Bug>> {
        self.query(move |conn| bugs::table.find(id).first(conn).optional())
            .await
    }

    /// Checks whether a bug with the given title was ever reported.
    pub async fn bug_title_taken(&self, title: String) -> Fallible<bool> {
        self.query(move |conn| {
            bugs::table
                .filter(bugs::title.eq(&title))
                .count()
                .get_result::<i64>(conn)
                .map(|n| n > 0)
        })
        .await
    }

    /// Reports a bug, returning its ID.
    pub async fn create_bug(
        &self,
        title: String,
        information: String,
        reported_on: NaiveDate,
    ) -> Fallible<i32> {
        self.query(move |conn| {
            insert_into(bugs::table)
                .values((
                    bugs::title.eq(&title),
                    bugs::information.eq(&information),
                    bugs::reported_on.eq(reported_on),
                ))
                .returning(bugs::id)
                .get_result(conn)
        })
        .await
    }

    /// Marks a bug as corrected.
    pub async fn correct_bug(&self, id: i32) -> Fallible<()> {
        self.query(move |conn| {
            update(bugs::table.find(id))
                .set(bugs::corrected.eq(true))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }
}
