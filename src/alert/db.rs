//! Database operations for alerts.

use rusqlite::{Connection, Row};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    alert::{Alert, AlertId, AlertKind},
    subscription::SubscriptionId,
    user::UserID,
};

/// The data needed to insert an alert.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewAlert {
    pub user_id: UserID,
    pub message: String,
    pub kind: AlertKind,
    pub subscription_id: Option<SubscriptionId>,
    pub billing_date: Option<Date>,
}

/// Initialize the alert table and indexes.
///
/// Upcoming charge alerts are unique per subscription and billing date, so generating them
/// again is a no-op.
pub fn create_alert_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS alert (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            message TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'general',
            subscription_id INTEGER,
            billing_date TEXT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(subscription_id) REFERENCES subscription(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_alert_upcoming_charge
            ON alert(subscription_id, billing_date, kind) WHERE kind = 'upcoming_charge';
        CREATE INDEX IF NOT EXISTS idx_alert_user_is_read ON alert(user_id, is_read);",
    )?;

    Ok(())
}

/// Insert an unread alert, skipping it if an identical upcoming charge alert exists.
///
/// Returns whether a row was inserted.
pub(crate) fn insert_alert(
    alert: NewAlert,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<bool, Error> {
    let created_at = created_at.to_offset(UtcOffset::UTC);

    let rows_inserted = connection.execute(
        "INSERT OR IGNORE INTO alert
            (user_id, message, is_read, created_at, kind, subscription_id, billing_date)
         VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6)",
        (
            alert.user_id.as_i64(),
            &alert.message,
            created_at,
            alert.kind,
            alert.subscription_id,
            alert.billing_date,
        ),
    )?;

    Ok(rows_inserted == 1)
}

/// The unread alerts of `user_id`, oldest first.
pub(crate) fn select_unread_alerts(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Alert>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, message, is_read, created_at, kind, subscription_id, billing_date
             FROM alert
             WHERE user_id = ?1 AND is_read = 0
             ORDER BY created_at ASC, id ASC",
        )?
        .query_map([user_id.as_i64()], map_alert_row)?
        .map(|maybe_alert| maybe_alert.map_err(Error::from))
        .collect()
}

/// Mark an unread alert as read, returning the number of rows changed.
pub(super) fn mark_alert_read_row(
    user_id: UserID,
    alert_id: AlertId,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE alert SET is_read = 1 WHERE id = ?1 AND user_id = ?2 AND is_read = 0",
            (alert_id, user_id.as_i64()),
        )
        .map_err(Error::from)
}

fn map_alert_row(row: &Row) -> Result<Alert, rusqlite::Error> {
    Ok(Alert {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        message: row.get(2)?,
        is_read: row.get(3)?,
        created_at: row.get(4)?,
        kind: row.get(5)?,
        subscription_id: row.get(6)?,
        billing_date: row.get(7)?,
    })
}
