//! Aggregation queries for the dashboard.

use rusqlite::{Connection, named_params};
use time::OffsetDateTime;

use crate::{Error, dashboard::Summary, user::UserID};

/// Summarize the active subscriptions of `user_id` created between `start` and `end`
/// inclusive. Missing bounds are open.
///
/// An empty selection gives a summary of zeros.
pub(super) fn select_summary(
    user_id: UserID,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    connection: &Connection,
) -> Result<Summary, Error> {
    connection
        .prepare(
            "SELECT
                COALESCE(SUM(monthly_amount), 0.0),
                COUNT(*),
                COALESCE(AVG(monthly_amount), 0.0)
             FROM (
                SELECT CASE billing_cycle
                        WHEN 'yearly' THEN amount / 12.0
                        ELSE amount
                    END AS monthly_amount
                FROM subscription
                WHERE user_id = :user_id
                  AND status = 'active'
                  AND (:start IS NULL OR julianday(created_at) >= julianday(:start))
                  AND (:end IS NULL OR julianday(created_at) <= julianday(:end))
             )",
        )?
        .query_row(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":start": start,
                ":end": end,
            },
            |row| {
                Ok(Summary {
                    total_monthly: row.get(0)?,
                    actives: row.get(1)?,
                    avg_amount: row.get(2)?,
                })
            },
        )
        .map_err(|error| error.into())
}
