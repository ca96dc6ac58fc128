//! Categories, foods, menus, and what the menus are composed of.

use crate::{
    dal::{
        schema::{categories, composed, foods, menus},
        DB,
    },
    schema::{Category, Composed, ComposedRow, Food, FoodRow, Menu, MenuRow},
};
use diesel::{
    dsl::{delete, insert_into, update},
    prelude::*,
    sql_query,
    sql_types::Integer,
};
use failure::Fallible;

/// A food to be created. New foods are always active.
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = foods)]
pub struct NewFood {
    /// The food's name.
    pub name: String,

    /// The database ID of the food's category.
    pub category_id: i32,

    /// Free-form information about the food.
    pub information: String,

    /// The database ID of the person registering the food.
    pub owner_id: i32,
}

/// A menu to be created. New menus are always active.
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = menus)]
pub struct NewMenu {
    /// The menu's name.
    pub name: String,

    /// Free-form information about the menu.
    pub information: String,

    /// The database ID of the person composing the menu.
    pub owner_id: i32,
}

impl DB {
    /// Gets the categories that haven't been deleted.
    pub async fn list_categories(&self) -> Fallible<Vec<Category>> {
        self.query(|conn| {
            categories::table
                .filter(categories::active.eq(true))
                .order(categories::name.asc())
                .load(conn)
        })
        .await
    }

    /// Gets a category by ID.
    pub async fn get_category(&self, id: i32) -> Fallible<Option<Category>> {
        self.query(move |conn| categories::table.find(id).first(conn).optional())
            .await
    }

    /// Checks whether an active category other than `except` has the given name.
    pub async fn category_name_taken(&self, name: String, except: Option<i32>) -> Fallible<bool> {
        self.query(move |conn| {
            categories::table
                .filter(categories::name.eq(&name))
                .filter(categories::active.eq(true))
                .select(categories::id)
                .load::<i32>(conn)
                .map(|ids| ids.into_iter().any(|id| Some(id) != except))
        })
        .await
    }

    /// Creates a category, returning its ID.
    pub async fn create_category(&self, name: String) -> Fallible<i32> {
        self.query(move |conn| {
            insert_into(categories::table)
                .values(categories::name.eq(&name))
                .returning(categories::id)
                .get_result(conn)
        })
        .await
    }

    /// Renames a category.
    pub async fn rename_category(&self, id: i32, name: String) -> Fallible<()> {
        self.query(move |conn| {
            update(categories::table.find(id))
                .set(categories::name.eq(&name))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Marks a category as deleted.
    pub async fn deactivate_category(&self, id: i32) -> Fallible<()> {
        self.query(move |conn| {
            update(categories::table.find(id))
                .set(categories::active.eq(false))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Gets the foods that haven't been deleted, with their category and owner resolved.
    pub async fn list_food_rows(&self) -> Fallible<Vec<FoodRow>> {
        self.query(|conn| {
            sql_query(
                "SELECT f.id, f.name, c.name AS category, f.information, p.name AS owner \
                 FROM foods f \
                 JOIN categories c ON c.id = f.category_id \
                 JOIN persons p ON p.id = f.owner_id \
                 WHERE f.active = 1 \
                 ORDER BY f.id ASC",
            )
            .load(conn)
        })
        .await
    }

    /// Gets a food by ID.
    pub async fn get_food(&self, id: i32) -> Fallible<Option<Food>> {
        self.query(move |conn| foods::table.find(id).first(conn).optional())
            .await
    }

    /// Checks whether an active food other than `except` has the given name.
    pub async fn food_name_taken(&self, name: String, except: Option<i32>) -> Fallible<bool> {
        self.query(move |conn| {
            foods::table
                .filter(foods::name.eq(&name))
                .filter(foods::active.eq(true))
                .select(foods::id)
                .load::<i32>(conn)
                .map(|ids| ids.into_iter().any(|id| Some(id) != except))
        })
        .await
    }

    /// Creates a food, returning its ID.
    pub async fn create_food(&self, food: NewFood) -> Fallible<i32> {
        self.query(move |conn| {
            insert_into(foods::table)
                .values(&food)
                .returning(foods::id)
                .get_result(conn)
        })
        .await
    }

    /// Overwrites a food's name, category and information. The owner stays the same.
    pub async fn update_food(
        &self,
        id: i32,
        name: String,
        category: i32,
        information: String,
    ) -> Fallible<()> {
        self.query(move |conn| {
            update(foods::table.find(id))
                .set((
                    foods::name.eq(&name),
                    foods::category_id.eq(category),
                    foods::information.eq(&information),
                ))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Marks a food as deleted.
    pub async fn deactivate_food(&self, id: i32) -> Fallible<()> {
        self.query(move |conn| {
            update(foods::table.find(id))
                .set(foods::active.eq(false))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Gets the active foods that aren't part of the given menu yet.
    pub async fn list_foods_not_in_menu(&self, menu: i32) -> Fallible<Vec<Food>> {
        self.query(move |conn| {
            let present = composed::table
                .filter(composed::menu_id.eq(menu))
                .select(composed::food_id)
                .load::<i32>(conn)?;
            foods::table
                .filter(foods::active.eq(true))
                .order(foods::name.asc())
                .load::<Food>(conn)
                .map(|foods| {
                    foods
                        .into_iter()
                        .filter(|food| !present.contains(&food.id))
                        .collect()
                })
        })
        .await
    }

    /// Gets the menus that haven't been deleted, with their owner resolved.
    pub async fn list_menu_rows(&self) -> Fallible<Vec<MenuRow>> {
        self.query(|conn| {
            sql_query(
                "SELECT m.id, m.name, m.information, m.active, p.name AS owner \
                 FROM menus m \
                 JOIN persons p ON p.id = m.owner_id \
                 WHERE m.active = 1 \
                 ORDER BY m.id ASC",
            )
            .load(conn)
        })
        .await
    }

    /// Gets a menu by ID, with its owner resolved.
    pub async fn get_menu_row(&self, id: i32) -> Fallible<Option<MenuRow>> {
        self.query(move |conn| {
            sql_query(
                "SELECT m.id, m.name, m.information, m.active, p.name AS owner \
                 FROM menus m \
                 JOIN persons p ON p.id = m.owner_id \
                 WHERE m.id = ?",
            )
            .bind::<Integer, _>(id)
            .get_result(conn)
            .optional()
        })
        .await
    }

    /// Gets the active menus.
    pub async fn list_active_menus(&self) -> Fallible<Vec<Menu>> {
        self.query(|conn| {
            menus::table
                .filter(menus::active.eq(true))
                .order(menus::name.asc())
                .load(conn)
        })
        .await
    }

    /// Gets a menu by ID.
    pub async fn get_menu(&self, id: i32) -> Fallible<Option<Menu>> {
        self.query(move |conn| menus::table.find(id).first(conn).optional())
            .await
    }

    /// Checks whether an active menu other than `except` has the given name.
    pub async fn menu_name_taken(&self, name: String, except: Option<i32>) -> Fallible<bool> {
        self.query(move |conn| {
            menus::table
                .filter(menus::name.eq(&name))
                .filter(menus::active.eq(true))
                .select(menus::id)
                .load::<i32>(conn)
                .map(|ids| ids.into_iter().any(|id| Some(id) != except))
        })
        .await
    }

    /// Creates a menu, returning its ID.
    pub async fn create_menu(&self, menu: NewMenu) -> Fallible<i32> {
        self.query(move |conn| {
            insert_into(menus::table)
                .values(&menu)
                .returning(menus::id)
                .get_result(conn)
        })
        .await
    }

    /// Overwrites a menu's name, information and active flag.
    pub async fn update_menu(
        &self,
        id: i32,
        name: String,
        information: String,
        active: bool,
    ) -> Fallible<()> {
        self.query(move |conn| {
            update(menus::table.find(id))
                .set((
                    menus::name.eq(&name),
                    menus::information.eq(&information),
                    menus::active.eq(active),
                ))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Marks a menu as deleted.
    pub async fn deactivate_menu(&self, id: i32) -> Fallible<()> {
        self.query(move |conn| {
            update(menus::table.find(id))
                .set(menus::active.eq(false))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Creates a new menu with the same information and foods as an existing one, returning its
    /// ID.
    pub async fn copy_menu(&self, from: i32, menu: NewMenu) -> Fallible<i32> {
        self.query(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let id = insert_into(menus::table)
                    .values(&menu)
                    .returning(menus::id)
                    .get_result::<i32>(conn)?;
                let rows = composed::table
                    .filter(composed::menu_id.eq(from))
                    .order(composed::food_id.asc())
                    .load::<Composed>(conn)?;
                for row in rows {
                    let _ = insert_into(composed::table)
                        .values((
                            composed::menu_id.eq(id),
                            composed::food_id.eq(row.food_id),
                            composed::quantity.eq(row.quantity),
                        ))
                        .execute(conn)?;
                }
                Ok(id)
            })
        })
        .await
    }

    /// Gets the foods a menu is composed of.
    pub async fn list_composed(&self, menu: i32) -> Fallible<Vec<ComposedRow>> {
        self.query(move |conn| {
            sql_query(
                "SELECT f.id AS food_id, f.name, c.name AS category, f.information, x.quantity \
                 FROM composed x \
                 JOIN foods f ON f.id = x.food_id \
                 JOIN categories c ON c.id = f.category_id \
                 WHERE x.menu_id = ? \
                 ORDER BY f.id ASC",
            )
            .bind::<Integer, _>(menu)
            .load(conn)
        })
        .await
    }

    /// Gets one food of a menu.
    pub async fn get_composed(&self, menu: i32, food: i32) -> Fallible<Option<Composed>> {
        self.query(move |conn| {
            composed::table
                .find((menu, food))
                .first(conn)
                .optional()
        })
        .await
    }

    /// Adds a food to a menu.
    pub async fn add_composed(&self, menu: i32, food: i32, quantity: i32) -> Fallible<()> {
        self.query(move |conn| {
            insert_into(composed::table)
                .values((
                    composed::menu_id.eq(menu),
                    composed::food_id.eq(food),
                    composed::quantity.eq(quantity),
                ))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Changes how much of a food a menu contains.
    pub async fn set_composed_quantity(
        &self,
        menu: i32,
        food: i32,
        quantity: i32,
    ) -> Fallible<()> {
        self.query(move |conn| {
            update(composed::table.find((menu, food)))
                .set(composed::quantity.eq(quantity))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }

    /// Removes a food from a menu. This is the one place rows really get deleted: the row only
    /// ever meant "this menu contains this food".
    pub async fn remove_composed(&self, menu: i32, food: i32) -> Fallible<()> {
        self.query(move |conn| {
            delete(composed::table.find((menu, food)))
                .execute(conn)
                .map(|_| ())
        })
        .await
    }
}
