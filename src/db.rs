//! Creates the application's database schema and hands out the shared connection.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, alert::create_alert_table, category::create_category_table,
    charge::create_charge_table, subscription::create_subscription_table,
    user::create_user_table,
};

/// Create all the tables and indexes for the domain models if they do not exist.
///
/// Foreign key enforcement is switched on for `connection`, which is needed for
/// the cascading deletes of users and subscriptions.
///
/// # Errors
///
/// Returns an error if any of the SQL statements fail.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_subscription_table(&transaction)?;
    create_charge_table(&transaction)?;
    create_alert_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the shared database connection.
///
/// # Errors
///
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Check whether `error` was caused by a UNIQUE constraint failing.
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    // Code 2067 occurs when a UNIQUE constraint failed.
    matches!(error, rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 2067)
}

#[cfg(test)]
pub(crate) mod test_utils {
    //! Fixtures shared by the database and service tests.

    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        PasswordHash, User,
        db::initialize,
        user::{NewUser, create_user},
    };

    /// The point in time used by tests that do not care about the exact time.
    pub const TEST_NOW: OffsetDateTime = datetime!(2025-01-15 12:00:00 UTC);

    pub fn get_test_connection() -> Connection {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    pub fn insert_test_user(email: &str, connection: &Connection) -> User {
        create_user(
            NewUser {
                name: "Test User".to_owned(),
                email: email.to_owned(),
                password_hash: PasswordHash::new_unchecked("definitelyapasswordhash"),
            },
            TEST_NOW,
            connection,
        )
        .expect("Could not create test user")
    }
}
