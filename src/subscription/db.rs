//! Database operations for subscriptions.

use rusqlite::{Connection, OptionalExtension, Row, named_params};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    category::CategoryId,
    db::is_unique_violation,
    subscription::{
        BillingCycle, Subscription, SubscriptionId, SubscriptionStatus,
    },
    user::UserID,
};

/// The validated, user editable fields of a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionDetails {
    /// The category the subscription belongs to.
    pub category_id: CategoryId,
    /// The name of the service.
    pub service_name: String,
    /// The amount billed each cycle.
    pub amount: f64,
    /// How often the subscription is billed.
    pub billing_cycle: BillingCycle,
    /// The date of the next charge.
    pub next_billing_date: Date,
}

/// Initialize the subscription table and indexes.
pub fn create_subscription_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS subscription (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            service_name TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            billing_cycle TEXT NOT NULL CHECK (billing_cycle IN ('monthly', 'yearly')),
            next_billing_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'canceled')),
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_subscription_user_service
            ON subscription(user_id, service_name);
        CREATE INDEX IF NOT EXISTS idx_subscription_category ON subscription(category_id);
        CREATE INDEX IF NOT EXISTS idx_subscription_next_billing_date
            ON subscription(user_id, next_billing_date);",
    )?;

    Ok(())
}

/// Insert an active subscription for `user_id`.
///
/// # Errors
///
/// Returns [Error::DuplicateSubscriptionName] if the user already has a subscription for the
/// service, or [Error::InvalidForeignKey] if the category does not exist.
pub(super) fn insert_subscription(
    user_id: UserID,
    details: SubscriptionDetails,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Subscription, Error> {
    let created_at = created_at.to_offset(UtcOffset::UTC);

    connection
        .execute(
            "INSERT INTO subscription
                (user_id, category_id, service_name, amount, billing_cycle, next_billing_date, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                user_id.as_i64(),
                details.category_id,
                &details.service_name,
                details.amount,
                details.billing_cycle,
                details.next_billing_date,
                SubscriptionStatus::Active,
                created_at,
            ),
        )
        .map_err(|error| map_write_error(error, &details.service_name))?;

    Ok(Subscription {
        id: connection.last_insert_rowid(),
        user_id,
        category_id: details.category_id,
        service_name: details.service_name,
        amount: details.amount,
        billing_cycle: details.billing_cycle,
        next_billing_date: details.next_billing_date,
        status: SubscriptionStatus::Active,
        created_at,
    })
}

/// Retrieve the subscription `subscription_id` if it is owned by `user_id`.
pub(crate) fn get_subscription_by_id(
    user_id: UserID,
    subscription_id: SubscriptionId,
    connection: &Connection,
) -> Result<Option<Subscription>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, service_name, amount, billing_cycle,
                    next_billing_date, status, created_at
             FROM subscription WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &subscription_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .optional()
        .map_err(|error| error.into())
}

/// Check whether `user_id` has a subscription called `service_name`, ignoring
/// the subscription `excluding` if given.
pub(super) fn is_service_name_taken(
    user_id: UserID,
    service_name: &str,
    excluding: Option<SubscriptionId>,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .prepare(
            "SELECT EXISTS(
                SELECT 1 FROM subscription
                WHERE user_id = :user_id AND service_name = :service_name
                  AND (:excluding IS NULL OR id != :excluding)
             )",
        )?
        .query_row(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":service_name": service_name,
                ":excluding": excluding,
            },
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Retrieve the subscriptions of `user_id` ordered by their next billing date.
///
/// `status` and `category_id` narrow down the results when given.
pub(super) fn select_subscriptions(
    user_id: UserID,
    status: Option<SubscriptionStatus>,
    category_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<Vec<Subscription>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, service_name, amount, billing_cycle,
                    next_billing_date, status, created_at
             FROM subscription
             WHERE user_id = :user_id
               AND (:status IS NULL OR status = :status)
               AND (:category_id IS NULL OR category_id = :category_id)
             ORDER BY next_billing_date ASC, id ASC",
        )?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":status": status,
                ":category_id": category_id,
            },
            map_row,
        )?
        .map(|maybe_subscription| maybe_subscription.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the editable fields of a subscription.
///
/// Returns the number of rows changed.
pub(super) fn update_subscription(
    user_id: UserID,
    subscription_id: SubscriptionId,
    details: &SubscriptionDetails,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE subscription
             SET category_id = ?1, service_name = ?2, amount = ?3, billing_cycle = ?4,
                 next_billing_date = ?5
             WHERE id = ?6 AND user_id = ?7",
            (
                details.category_id,
                &details.service_name,
                details.amount,
                details.billing_cycle,
                details.next_billing_date,
                subscription_id,
                user_id.as_i64(),
            ),
        )
        .map_err(|error| map_write_error(error, &details.service_name))
}

/// Cancel a subscription if it is still active.
///
/// Returns the number of rows changed, which is zero if the subscription is missing or
/// already canceled.
pub(super) fn cancel_subscription_row(
    user_id: UserID,
    subscription_id: SubscriptionId,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE subscription SET status = 'canceled'
             WHERE id = ?1 AND user_id = ?2 AND status = 'active'",
            (subscription_id, user_id.as_i64()),
        )
        .map_err(|error| error.into())
}

/// Move the next billing date of an active subscription from `previous` to `next`.
///
/// Returns the number of rows changed, which is zero if another request already moved
/// the date or canceled the subscription.
pub(crate) fn advance_next_billing_date(
    subscription_id: SubscriptionId,
    previous: Date,
    next: Date,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE subscription SET next_billing_date = ?1
             WHERE id = ?2 AND next_billing_date = ?3 AND status = 'active'",
            (next, subscription_id, previous),
        )
        .map_err(|error| error.into())
}

fn map_write_error(error: rusqlite::Error, service_name: &str) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateSubscriptionName(service_name.to_owned())
    } else {
        error.into()
    }
}

fn map_row(row: &Row) -> Result<Subscription, rusqlite::Error> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        service_name: row.get(3)?,
        amount: row.get(4)?,
        billing_cycle: row.get(5)?,
        next_billing_date: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
    })
}
