//! Alert generation for charges coming up in the next week.

use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    alert::{
        Alert, AlertId, AlertKind, NewAlert, db::mark_alert_read_row, insert_alert,
        select_unread_alerts,
    },
    dashboard::{UpcomingWindow, get_upcoming},
    user::{UserID, get_user_by_id},
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// List the unread alerts of `user_id`, oldest first.
///
/// Before listing, an alert is created for every pending charge in the coming week. An
/// upcoming charge is only announced once per subscription and billing date, so calling
/// this repeatedly does not flood the user with copies.
pub fn list_alerts(
    user_id: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<Alert>, Error> {
    let upcoming = get_upcoming(user_id, UpcomingWindow::week_from(now.date()), connection)?;

    if !upcoming.is_empty() {
        let currency = get_user_by_id(user_id, connection)?.currency;
        let mut created = 0;

        for upcoming_charge in upcoming {
            let left_days = days_until(upcoming_charge.next_billing_date, now);
            let inserted = insert_alert(
                NewAlert {
                    user_id,
                    message: format!(
                        "Subscription for {} will be charged in {left_days} days ({currency} {:.2})",
                        upcoming_charge.service_name, upcoming_charge.charge.amount
                    ),
                    kind: AlertKind::UpcomingCharge,
                    subscription_id: Some(upcoming_charge.charge.subscription_id),
                    billing_date: Some(upcoming_charge.next_billing_date),
                },
                now,
                connection,
            )?;

            if inserted {
                created += 1;
            }
        }

        tracing::debug!("Created {created} upcoming charge alerts for user {user_id}");
    }

    select_unread_alerts(user_id, connection)
}

/// Mark the alert `alert_id` of `user_id` as read.
///
/// Alerts that are already read, missing or owned by someone else are left alone.
pub fn mark_alert_read(
    user_id: UserID,
    alert_id: AlertId,
    connection: &Connection,
) -> Result<(), Error> {
    if mark_alert_read_row(user_id, alert_id, connection)? == 0 {
        tracing::debug!("Alert {alert_id} for user {user_id} was not unread, nothing to do.");
    }

    Ok(())
}

/// Whole days from `now` until the start of `date`, rounded up.
fn days_until(date: Date, now: OffsetDateTime) -> i64 {
    let remaining = date.midnight().assume_offset(now.offset()) - now;

    (remaining.as_seconds_f64() / SECONDS_PER_DAY).ceil() as i64
}
