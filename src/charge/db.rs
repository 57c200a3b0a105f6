//! Database operations for charges.

use rusqlite::{Connection, Row, named_params};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    charge::{Charge, ChargeId, ChargeStatus},
    subscription::SubscriptionId,
    user::UserID,
};

/// Initialize the charge table and indexes.
pub fn create_charge_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS charge (
            id INTEGER PRIMARY KEY,
            subscription_id INTEGER NOT NULL,
            charge_date TEXT NOT NULL,
            amount REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'paid')),
            created_at TEXT NOT NULL,
            FOREIGN KEY(subscription_id) REFERENCES subscription(id)
                ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_charge_subscription ON charge(subscription_id);
        CREATE INDEX IF NOT EXISTS idx_charge_date ON charge(charge_date);",
    )?;

    Ok(())
}

/// Insert a pending charge for `subscription_id`.
pub(super) fn insert_charge(
    subscription_id: SubscriptionId,
    charge_date: Date,
    amount: f64,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Charge, Error> {
    let created_at = created_at.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO charge (subscription_id, charge_date, amount, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            subscription_id,
            charge_date,
            amount,
            ChargeStatus::Pending,
            created_at,
        ),
    )?;

    Ok(Charge {
        id: connection.last_insert_rowid(),
        subscription_id,
        charge_date,
        amount,
        status: ChargeStatus::Pending,
        created_at,
    })
}

/// Retrieve the charges of every subscription owned by `user_id`, newest first.
///
/// `from` and `to` are inclusive bounds on the charge date.
pub(super) fn select_charges(
    user_id: UserID,
    from: Option<Date>,
    to: Option<Date>,
    status: Option<ChargeStatus>,
    connection: &Connection,
) -> Result<Vec<Charge>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.subscription_id, c.charge_date, c.amount, c.status, c.created_at
             FROM charge c
             INNER JOIN subscription s ON s.id = c.subscription_id
             WHERE s.user_id = :user_id
               AND (:from IS NULL OR c.charge_date >= :from)
               AND (:to IS NULL OR c.charge_date <= :to)
               AND (:status IS NULL OR c.status = :status)
             ORDER BY c.charge_date DESC, c.id DESC",
        )?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":from": from,
                ":to": to,
                ":status": status,
            },
            map_row,
        )?
        .map(|maybe_charge| maybe_charge.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the charges of `subscription_id`, newest first.
pub(super) fn select_charges_by_subscription(
    subscription_id: SubscriptionId,
    connection: &Connection,
) -> Result<Vec<Charge>, Error> {
    connection
        .prepare(
            "SELECT id, subscription_id, charge_date, amount, status, created_at
             FROM charge WHERE subscription_id = :subscription_id
             ORDER BY charge_date DESC, id DESC",
        )?
        .query_map(&[(":subscription_id", &subscription_id)], map_row)?
        .map(|maybe_charge| maybe_charge.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the pending charges of the active subscriptions of `user_id` with a charge
/// date between `from` and `to` inclusive.
///
/// Each charge is returned with the service name and next billing date of its subscription.
pub(crate) fn select_upcoming_charges(
    user_id: UserID,
    from: Date,
    to: Date,
    connection: &Connection,
) -> Result<Vec<(Charge, String, Date)>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.subscription_id, c.charge_date, c.amount, c.status, c.created_at,
                    s.service_name, s.next_billing_date
             FROM charge c
             INNER JOIN subscription s ON s.id = c.subscription_id
             WHERE s.user_id = :user_id
               AND s.status = 'active'
               AND c.status = 'pending'
               AND c.charge_date BETWEEN :from AND :to
             ORDER BY c.charge_date ASC, c.id ASC",
        )?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":from": from,
                ":to": to,
            },
            |row| Ok((map_row(row)?, row.get(6)?, row.get(7)?)),
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Mark a pending charge of `user_id` as paid.
///
/// Returns the number of rows changed, which is zero if the charge is missing, belongs to
/// another user or was already paid.
pub(super) fn pay_charge_row(
    user_id: UserID,
    charge_id: ChargeId,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE charge SET status = 'paid'
             WHERE id = ?1
               AND status = 'pending'
               AND subscription_id IN (SELECT id FROM subscription WHERE user_id = ?2)",
            (charge_id, user_id.as_i64()),
        )
        .map_err(|error| error.into())
}

/// Check whether `charge_id` belongs to one of the subscriptions of `user_id`.
pub(super) fn charge_exists(
    user_id: UserID,
    charge_id: ChargeId,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .prepare(
            "SELECT EXISTS(
                SELECT 1 FROM charge c
                INNER JOIN subscription s ON s.id = c.subscription_id
                WHERE c.id = :id AND s.user_id = :user_id
             )",
        )?
        .query_row(
            &[(":id", &charge_id), (":user_id", &user_id.as_i64())],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Charge, rusqlite::Error> {
    Ok(Charge {
        id: row.get(0)?,
        subscription_id: row.get(1)?,
        charge_date: row.get(2)?,
        amount: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}
