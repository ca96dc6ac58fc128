use crate::{
    dal::{
        schema::{meals, trays},
        DB,
    },
    schema::{Meal, MealRow},
};
use chrono::NaiveDateTime;
use diesel::{
    dsl::{insert_into, update},
    prelude::*,
    sql_query,
    sql_types::Integer,
    sqlite::SqliteConnection,
};
use failure::Fallible;

/// Every meal row comes with the names of what it refers to.
const MEAL_ROWS: &str = "\
    SELECT m.id, m.candidate_id, c.name AS candidate, m.menu_id, mn.name AS menu, \
           mn.information AS menu_information, t.name AS tray, m.responsible_id, \
           r.name AS responsible, m.information, m.started_at, m.ended_at, m.active \
    FROM meals m \
    JOIN persons c ON c.id = m.candidate_id \
    JOIN menus mn ON mn.id = m.menu_id \
    JOIN trays t ON t.id = m.tray_id \
    JOIN users u ON u.id = m.responsible_id \
    JOIN persons r ON r.id = u.person_id";

/// A meal to be started.
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = meals)]
pub struct NewMeal {
    /// The database ID of the tray serving the meal.
    pub tray_id: i32,

    /// The database ID of the menu being served.
    pub menu_id: i32,

    /// The database ID of the user starting the meal.
    pub responsible_id: i32,

    /// The database ID of the person being served.
    pub candidate_id: i32,

    /// Free-form information about the meal.
    pub information: String,

    /// When the meal starts.
    pub started_at: NaiveDateTime,
}

/// The fields of a meal that can be changed after it started.
#[derive(AsChangeset, Clone, Debug)]
#[diesel(table_name = meals)]
pub struct MealChanges {
    /// The database ID of the menu being served.
    pub menu_id: i32,

    /// The database ID of the person being served.
    pub candidate_id: i32,

    /// Free-form information about the meal.
    pub information: String,
}

impl DB {
    /// Gets every meal that hasn't been deleted.
    pub async fn list_meal_rows(&self) -> Fallible<Vec<MealRow>> {
        self.query(|conn| {
            sql_query(format!(
                "{} WHERE m.active = 1 ORDER BY m.id ASC",
                MEAL_ROWS
            ))
            .load(conn)
        })
        .await
    }

    /// Gets the meals that are being served right now, latest first.
    pub async fn list_ongoing_meal_rows(&self) -> Fallible<Vec<MealRow>> {
        self.query(|conn| {
            sql_query(format!(
                "{} WHERE m.active = 1 AND m.ended_at IS NULL ORDER BY m.started_at DESC",
                MEAL_ROWS
            ))
            .load(conn)
        })
        .await
    }

    /// Gets the meals a person was served.
    pub async fn list_meal_rows_for_candidate(&self, person: i32) -> Fallible<Vec<MealRow>> {
        self.query(move |conn| {
            sql_query(format!(
                "{} WHERE m.active = 1 AND m.candidate_id = ? ORDER BY m.started_at DESC",
                MEAL_ROWS
            ))
            .bind::<Integer, _>(person)
            .load(conn)
        })
        .await
    }

    /// Gets a meal by ID, with everything it refers to resolved.
    pub async fn get_meal_row(&self, id: i32) -> Fallible<Option<MealRow>> {
        self.query(move |conn| {
            sql_query(format!("{} WHERE m.id = ?", MEAL_ROWS))
                .bind::<Integer, _>(id)
                .get_result(conn)
                .optional()
        })
        .await
    }

    /// Gets a meal by ID.
    pub async fn get_meal(&self, id: i32) -> Fallible<Option<Meal>> {
        self.query(move |conn| meals::table.find(id).first(conn).optional())
            .await
    }

    /// Counts the meals being served right now.
    pub async fn count_ongoing_meals(&self) -> Fallible<i64> {
        self.query(|conn| {
            meals::table
                .filter(meals::active.eq(true))
                .filter(meals::ended_at.is_null())
                .count()
                .get_result(conn)
        })
        .await
    }

    /// Gets the meal a tray is serving right now, if any.
    pub async fn get_ongoing_meal_on_tray(&self, tray: i32) -> Fallible<Option<Meal>> {
        self.query(move |conn| {
            meals::table
                .filter(meals::tray_id.eq(tray))
                .filter(meals::active.eq(true))
                .filter(meals::ended_at.is_null())
                .order(meals::id.desc())
                .first(conn)
                .optional()
        })
        .await
    }

    /// Starts a meal, marking its tray as in use. Returns the meal's ID.
    pub async fn start_meal(&self, meal: NewMeal) -> Fallible<i32> {
        self.query(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let id = insert_into(meals::table)
                    .values(&meal)
                    .returning(meals::id)
                    .get_result(conn)?;
                let _ = update(trays::table.find(meal.tray_id))
                    .set(trays::in_use.eq(true))
                    .execute(conn)?;
                Ok(id)
            })
        })
        .await
    }

    /// Overwrites the fields of a meal that can change after it started.
    pub async fn update_meal(&self, id: i32, changes: MealChanges) -> Fallible<()> {
        self.query(move |conn| {
            update(meals::table.find(id))
                .set(&changes)
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Ends a meal, releasing its tray. Ending a meal that already ended does nothing.
    pub async fn finish_meal(&self, id: i32, at: NaiveDateTime) -> Fallible<()> {
        self.query(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| end_meal(conn, id, at))
        })
        .await
    }

    /// Marks a meal as deleted. A meal deleted while ongoing is ended first, so its tray gets
    /// released.
    pub async fn deactivate_meal(&self, id: i32, at: NaiveDateTime) -> Fallible<()> {
        self.query(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                end_meal(conn, id, at)?;
                update(meals::table.find(id))
                    .set(meals::active.eq(false))
                    .execute(conn)
                    .map(|_| ())
            })
        })
        .await
    }
}

fn end_meal(conn: &mut SqliteConnection, id: i32, at: NaiveDateTime) -> QueryResult<()> {
    let meal = meals::table.find(id).first::<Meal>(conn)?;
    if meal.ended_at.is_some() {
        return Ok(());
    }

    let _ = update(meals::table.find(id))
        .set(meals::ended_at.eq(Some(at)))
        .execute(conn)?;
    let _ = update(trays::table.find(meal.tray_id))
        .set(trays::in_use.eq(false))
        .execute(conn)?;
    Ok(())
}
