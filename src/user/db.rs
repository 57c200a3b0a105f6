//! Database operations for users.

use rusqlite::{Connection, Row};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error, PasswordHash,
    user::{DEFAULT_CURRENCY, User, UserID},
};

/// The data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user's display name.
    pub name: String,
    /// The user's email address. It is stored in lowercase.
    pub email: String,
    /// The hash of the user's password.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                currency TEXT NOT NULL DEFAULT 'BRL',
                notifications_enabled INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateEmail] if the email is already registered,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    new_user: NewUser,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    let email = new_user.email.to_lowercase();
    let created_at = created_at.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO user (name, email, password, currency, notifications_enabled, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        (
            &new_user.name,
            &email,
            new_user.password_hash.as_ref(),
            DEFAULT_CURRENCY,
            created_at,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name: new_user.name,
        email,
        password_hash: new_user.password_hash,
        currency: DEFAULT_CURRENCY.to_owned(),
        notifications_enabled: true,
        created_at,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::NotFound]),
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, name, email, password, currency, notifications_enabled, created_at
             FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, compared case-insensitively.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email address.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, name, email, password, currency, notifications_enabled, created_at
             FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", &email.to_lowercase())], map_row)
        .map_err(|error| error.into())
}

/// Overwrite the editable profile fields of a user.
///
/// Returns the number of rows changed.
pub(super) fn update_user_profile(
    user_id: UserID,
    name: &str,
    currency: &str,
    notifications_enabled: bool,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE user SET name = ?1, currency = ?2, notifications_enabled = ?3 WHERE id = ?4",
            (name, currency, notifications_enabled, user_id.as_i64()),
        )
        .map_err(|error| error.into())
}

/// Delete a user along with everything they own.
///
/// Returns the number of rows deleted.
pub(super) fn delete_user_row(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        currency: row.get(4)?,
        notifications_enabled: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod user_query_tests {
    use crate::{
        Error, PasswordHash,
        db::test_utils::{TEST_NOW, get_test_connection, insert_test_user},
        user::{NewUser, UserID, create_user, get_user_by_email, get_user_by_id},
    };

    #[test]
    fn insert_user_succeeds() {
        let connection = get_test_connection();

        let user = create_user(
            NewUser {
                name: "Foo".to_owned(),
                email: "foo@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
            },
            TEST_NOW,
            &connection,
        )
        .expect("Could not create user");

        assert!(user.id.as_i64() > 0);
        assert_eq!(user.currency, "BRL");
        assert!(user.notifications_enabled);
    }

    #[test]
    fn insert_user_lowercases_email() {
        let connection = get_test_connection();

        let user = insert_test_user("Foo@Bar.BAZ", &connection);

        assert_eq!(user.email, "foo@bar.baz");
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let connection = get_test_connection();
        insert_test_user("foo@bar.baz", &connection);

        let result = create_user(
            NewUser {
                name: "Other".to_owned(),
                email: "FOO@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter3"),
            },
            TEST_NOW,
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn select_user_by_id_round_trips() {
        let connection = get_test_connection();
        let inserted_user = insert_test_user("foo@bar.baz", &connection);

        let selected_user = get_user_by_id(inserted_user.id, &connection);

        assert_eq!(selected_user, Ok(inserted_user));
    }

    #[test]
    fn select_user_by_email_ignores_case() {
        let connection = get_test_connection();
        let inserted_user = insert_test_user("foo@bar.baz", &connection);

        let selected_user = get_user_by_email("FOO@BAR.BAZ", &connection);

        assert_eq!(selected_user, Ok(inserted_user));
    }

    #[test]
    fn select_missing_user_returns_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &connection),
            Err(Error::NotFound)
        );
    }
}
