//! Charge rules: creating a charge advances the subscription's billing date, and a charge
//! can only be paid once.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    alert::{AlertKind, NewAlert, insert_alert},
    charge::{
        Charge, ChargeId, ChargeStatus,
        db::{
            charge_exists, insert_charge, pay_charge_row, select_charges,
            select_charges_by_subscription,
        },
    },
    clock::parse_date,
    subscription::{
        SubscriptionId, SubscriptionStatus, advance_next_billing_date, get_subscription_by_id,
    },
    user::{UserID, get_user_by_id},
};

/// Query parameters for listing charges.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChargeFilter {
    /// Only include charges made on or after this date (`YYYY-MM-DD`).
    pub initial_period: Option<String>,
    /// Only include charges made on or before this date (`YYYY-MM-DD`).
    pub final_period: Option<String>,
    /// Only include charges with this status, "pending" or "paid".
    pub status: Option<String>,
}

/// Charge the subscription `subscription_id` of `user_id`.
///
/// The charge is dated today and copies the subscription's current amount. The
/// subscription's next billing date moves forward by one billing cycle from its previous
/// value and the user is alerted. All of this happens in a single transaction.
///
/// # Errors
///
/// Returns:
/// - [Error::SubscriptionNotFound] if the user has no such subscription,
/// - [Error::SubscriptionCanceled] if the subscription was canceled,
/// - [Error::ConcurrentUpdate] if the subscription changed while the charge was created.
pub fn create_charge(
    user_id: UserID,
    subscription_id: SubscriptionId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Charge, Error> {
    let transaction = connection.unchecked_transaction()?;

    let subscription = get_subscription_by_id(user_id, subscription_id, &transaction)?
        .ok_or(Error::SubscriptionNotFound)?;

    if subscription.status == SubscriptionStatus::Canceled {
        return Err(Error::SubscriptionCanceled);
    }

    let charge = insert_charge(
        subscription.id,
        now.date(),
        subscription.amount,
        now,
        &transaction,
    )?;

    let next_billing_date = subscription
        .billing_cycle
        .next_billing_date(subscription.next_billing_date)?;
    let rows_changed = advance_next_billing_date(
        subscription.id,
        subscription.next_billing_date,
        next_billing_date,
        &transaction,
    )?;

    if rows_changed == 0 {
        tracing::warn!(
            "Subscription {} changed while a charge was being created, rolling back.",
            subscription.id
        );
        return Err(Error::ConcurrentUpdate);
    }

    let currency = get_user_by_id(user_id, &transaction)?.currency;
    insert_alert(
        NewAlert {
            user_id,
            message: format!(
                "New charge registered for {} with amount {currency} {:.2}",
                subscription.service_name, charge.amount
            ),
            kind: AlertKind::ChargeCreated,
            subscription_id: Some(subscription.id),
            billing_date: Some(subscription.next_billing_date),
        },
        now,
        &transaction,
    )?;

    transaction.commit()?;
    tracing::info!(
        "Created charge {} for subscription {}, next billing date is {next_billing_date}",
        charge.id,
        subscription.id
    );

    Ok(charge)
}

/// Mark the charge `charge_id` of `user_id` as paid.
///
/// # Errors
///
/// Returns [Error::ChargeNotFound] if the charge does not exist or belongs to another user,
/// or [Error::ChargeAlreadyPaid] if it was paid before.
pub fn pay_charge(user_id: UserID, charge_id: ChargeId, connection: &Connection) -> Result<(), Error> {
    if pay_charge_row(user_id, charge_id, connection)? == 1 {
        return Ok(());
    }

    if charge_exists(user_id, charge_id, connection)? {
        Err(Error::ChargeAlreadyPaid)
    } else {
        Err(Error::ChargeNotFound)
    }
}

/// List the charges of `user_id`, newest first.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if a period bound is not a date, or
/// [Error::InvalidChargeStatus] if the status filter is not a known status.
pub fn list_charges(
    user_id: UserID,
    filter: ChargeFilter,
    connection: &Connection,
) -> Result<Vec<Charge>, Error> {
    let from = non_blank(filter.initial_period)
        .map(|text| parse_date(&text))
        .transpose()?;
    let to = non_blank(filter.final_period)
        .map(|text| parse_date(&text))
        .transpose()?;
    let status = non_blank(filter.status)
        .map(|text| text.parse::<ChargeStatus>())
        .transpose()?;

    select_charges(user_id, from, to, status, connection)
}

/// List the charges of `subscription_id`, newest first.
///
/// The caller is responsible for checking that the subscription belongs to the user.
pub fn list_charges_by_subscription(
    subscription_id: SubscriptionId,
    connection: &Connection,
) -> Result<Vec<Charge>, Error> {
    select_charges_by_subscription(subscription_id, connection)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
