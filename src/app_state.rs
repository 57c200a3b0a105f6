//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{Clock, DEFAULT_TOKEN_DURATION, Error, JwtKeys, db::initialize};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys used for signing and verifying bearer tokens.
    pub jwt_keys: JwtKeys,

    /// How long a freshly issued token stays valid.
    pub token_duration: Duration,

    /// The source of the current time.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// Tokens are signed with keys derived from `jwt_secret`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys::new(jwt_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            clock,
        })
    }
}

#[cfg(test)]
mod app_state_tests {
    use std::sync::Arc;

    use rusqlite::Connection;

    use crate::{DEFAULT_TOKEN_DURATION, FixedClock, db::test_utils::TEST_NOW};

    use super::AppState;

    #[test]
    fn new_initializes_database() {
        let connection = Connection::open_in_memory().unwrap();

        let state = AppState::new(connection, "foobar", Arc::new(FixedClock(TEST_NOW))).unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 5);
        assert_eq!(state.token_duration, DEFAULT_TOKEN_DURATION);
    }
}
