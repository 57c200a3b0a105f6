//! Database operations for categories.

use rusqlite::{Connection, OptionalExtension, Row, named_params};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName},
    db::is_unique_violation,
    user::UserID,
};

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            color TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_category_user_name ON category(user_id, name);",
    )?;

    Ok(())
}

/// Create a category and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if the user already has a category called `name`.
pub(super) fn insert_category(
    user_id: UserID,
    name: CategoryName,
    color: Option<String>,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Category, Error> {
    let created_at = created_at.to_offset(UtcOffset::UTC);

    connection
        .execute(
            "INSERT INTO category (user_id, name, color, created_at) VALUES (?1, ?2, ?3, ?4)",
            (user_id.as_i64(), name.as_ref(), &color, created_at),
        )
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateCategoryName(name.to_string())
            } else {
                error.into()
            }
        })?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        user_id,
        name,
        color,
        created_at,
    })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, color, created_at FROM category
             WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Find the category of `user_id` called `name`, if there is one.
pub(super) fn find_category_by_name(
    user_id: UserID,
    name: &CategoryName,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, color, created_at FROM category
             WHERE user_id = :user_id AND name = :name",
        )?
        .query_row(
            named_params! {":user_id": user_id.as_i64(), ":name": name.as_ref()},
            map_row,
        )
        .optional()
        .map_err(|error| error.into())
}

/// Retrieve the categories of `user_id` ordered alphabetically by name.
pub(super) fn select_categories(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, color, created_at FROM category
             WHERE user_id = :user_id ORDER BY name ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update the name and, if given, the color of a category.
///
/// Returns the number of rows changed.
pub(super) fn update_category(
    user_id: UserID,
    category_id: CategoryId,
    name: &CategoryName,
    color: Option<&str>,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE category SET name = ?1, color = COALESCE(?2, color)
             WHERE id = ?3 AND user_id = ?4",
            (name.as_ref(), color, category_id, user_id.as_i64()),
        )
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateCategoryName(name.to_string())
            } else {
                error.into()
            }
        })
}

/// Delete a category by ID.
///
/// Returns the number of rows deleted.
pub(super) fn delete_category_row(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, user_id.as_i64()),
        )
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        color: row.get(3)?,
        created_at: row.get(4)?,
    })
}
