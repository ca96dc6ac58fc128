use crate::{
    dal::{schema::persons, DB},
    schema::Person,
};
use chrono::NaiveDate;
use diesel::{
    dsl::{insert_into, update},
    prelude::*,
};
use failure::Fallible;

/// The writable fields of a person.
#[derive(AsChangeset, Clone, Debug, Insertable)]
#[diesel(table_name = persons)]
pub struct NewPerson {
    /// The person's name.
    pub name: String,

    /// The person's birthdate.
    pub birthdate: NaiveDate,

    /// The person's gender.
    pub gender: String,

    /// The person's weight.
    pub weight: f64,

    /// Whether the person is active.
    pub active: bool,
}

impl DB {
    /// Gets every person, deleted or not.
    pub async fn list_persons(&self) -> Fallible<Vec<Person>> {
        self.query(|conn| persons::table.order(persons::id.asc()).load(conn))
            .await
    }

    /// Gets the persons who haven't been deleted.
    pub async fn list_active_persons(&self) -> Fallible<Vec<Person>> {
        self.query(|conn| {
            persons::table
                .filter(persons::active.eq(true))
                .order(persons::name.asc())
                .load(conn)
        })
        .await
    }

    /// Gets a person by ID.
    pub async fn get_person(&self, id: i32) -> Fallible<Option<Person>> {
        self.query(move |conn| persons::table.find(id).first(conn).optional())
            .await
    }

    /// Creates a person, returning their ID.
    pub async fn create_person(&self, person: NewPerson) -> Fallible<i32> {
        self.query(move |conn| {
            insert_into(persons::table)
                .values(&person)
                .returning(persons::id)
                .get_result(conn)
        })
        .await
    }

    /// Overwrites a person's fields.
    pub async fn update_person(&self, id: i32, person: NewPerson) -> Fallible<()> {
        self.query(move |conn| {
            update(persons::table.find(id))
                .set(&person)
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Marks a person as deleted.
    pub async fn deactivate_person(&self, id: i32) -> Fallible<()> {
        self.query(move |conn| {
            update(persons::table.find(id))
                .set(persons::active.eq(false))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }
}
