//! Subscription lifecycle: validation, creation, editing and cancellation.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    alert::{AlertKind, NewAlert, insert_alert},
    category::{CategoryId, get_category},
    clock::parse_date,
    subscription::{
        BillingCycle, Subscription, SubscriptionId, SubscriptionStatus,
        db::{
            SubscriptionDetails, cancel_subscription_row, get_subscription_by_id,
            insert_subscription, is_service_name_taken, select_subscriptions,
            update_subscription,
        },
    },
    user::UserID,
};

/// The data sent to create or edit a subscription.
///
/// Every field is required when creating a subscription. When editing, omitted or blank
/// fields keep their current value.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SubscriptionForm {
    /// The category the subscription belongs to.
    pub category_id: Option<CategoryId>,
    /// The name of the service.
    pub service_name: Option<String>,
    /// The amount billed each cycle.
    pub amount: Option<f64>,
    /// "monthly" or "yearly".
    pub billing_cycle: Option<String>,
    /// The date of the next charge as `YYYY-MM-DD`.
    pub next_billing_date: Option<String>,
}

/// Query parameters for listing subscriptions.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    /// Only include subscriptions with this status, "active" or "canceled".
    pub status: Option<String>,
    /// Only include subscriptions in this category.
    pub category_id: Option<CategoryId>,
}

/// Validate `form` and create an active subscription for `user_id`.
///
/// # Errors
///
/// Returns:
/// - [Error::MissingFields] if any field is missing,
/// - [Error::DuplicateSubscriptionName] if the user already has a subscription with the name,
/// - [Error::InvalidAmount] if the amount is not greater than zero,
/// - [Error::InvalidDate] or [Error::BillingDateNotInFuture] for a bad next billing date,
/// - [Error::InvalidBillingCycle] if the billing cycle is not "monthly" or "yearly",
/// - [Error::InvalidCategory] if the category does not belong to the user.
pub fn create_subscription(
    user_id: UserID,
    form: SubscriptionForm,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Subscription, Error> {
    let details = validate(user_id, form, None, now.date(), connection)?;

    insert_subscription(user_id, details, now, connection)
}

/// Edit the subscription `subscription_id` of `user_id`.
///
/// # Errors
///
/// Returns [Error::SubscriptionNotFound] if the user has no such subscription, otherwise
/// the same errors as [create_subscription].
pub fn edit_subscription(
    user_id: UserID,
    subscription_id: SubscriptionId,
    form: SubscriptionForm,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let current = get_subscription_by_id(user_id, subscription_id, connection)?
        .ok_or(Error::SubscriptionNotFound)?;

    let merged = SubscriptionForm {
        category_id: form.category_id.or(Some(current.category_id)),
        service_name: non_blank(form.service_name).or(Some(current.service_name)),
        amount: form.amount.or(Some(current.amount)),
        billing_cycle: non_blank(form.billing_cycle)
            .or_else(|| Some(current.billing_cycle.to_string())),
        next_billing_date: non_blank(form.next_billing_date)
            .or_else(|| Some(current.next_billing_date.to_string())),
    };

    let details = validate(user_id, merged, Some(subscription_id), today, connection)?;
    update_subscription(user_id, subscription_id, &details, connection)?;

    Ok(())
}

/// List the subscriptions of `user_id` ordered by next billing date.
///
/// # Errors
///
/// Returns [Error::InvalidSubscriptionStatus] if the status filter is not a known status.
pub fn list_subscriptions(
    user_id: UserID,
    filter: SubscriptionFilter,
    connection: &Connection,
) -> Result<Vec<Subscription>, Error> {
    let status = non_blank(filter.status)
        .map(|status| status.parse::<SubscriptionStatus>())
        .transpose()?;

    select_subscriptions(user_id, status, filter.category_id, connection)
}

/// Get the subscription `subscription_id` of `user_id`.
///
/// A missing subscription, or one owned by another user, is `None`.
pub fn get_subscription(
    user_id: UserID,
    subscription_id: SubscriptionId,
    connection: &Connection,
) -> Result<Option<Subscription>, Error> {
    get_subscription_by_id(user_id, subscription_id, connection)
}

/// Cancel the subscription `subscription_id` of `user_id`.
///
/// Canceling an already canceled subscription succeeds without changing anything. The user
/// is alerted when an active subscription is canceled.
///
/// # Errors
///
/// Returns [Error::SubscriptionNotFound] if the user has no such subscription.
pub fn cancel_subscription(
    user_id: UserID,
    subscription_id: SubscriptionId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let subscription = get_subscription_by_id(user_id, subscription_id, &transaction)?
        .ok_or(Error::SubscriptionNotFound)?;

    if cancel_subscription_row(user_id, subscription_id, &transaction)? == 0 {
        tracing::debug!("Subscription {subscription_id} was already canceled.");
        return Ok(());
    }

    insert_alert(
        NewAlert {
            user_id,
            message: format!(
                "Your subscription to {} was canceled.",
                subscription.service_name
            ),
            kind: AlertKind::SubscriptionCanceled,
            subscription_id: Some(subscription_id),
            billing_date: None,
        },
        now,
        &transaction,
    )?;

    transaction.commit()?;
    tracing::info!("Canceled subscription {subscription_id} for user {user_id}");

    Ok(())
}

fn validate(
    user_id: UserID,
    form: SubscriptionForm,
    excluding: Option<SubscriptionId>,
    today: Date,
    connection: &Connection,
) -> Result<SubscriptionDetails, Error> {
    let (
        Some(category_id),
        Some(service_name),
        Some(amount),
        Some(billing_cycle),
        Some(next_billing_date),
    ) = (
        form.category_id,
        non_blank(form.service_name),
        form.amount,
        non_blank(form.billing_cycle),
        non_blank(form.next_billing_date),
    )
    else {
        return Err(Error::MissingFields(
            "category_id, service_name, amount, billing_cycle, next_billing_date".to_owned(),
        ));
    };

    if is_service_name_taken(user_id, &service_name, excluding, connection)? {
        return Err(Error::DuplicateSubscriptionName(service_name));
    }

    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    let next_billing_date = parse_date(&next_billing_date)?;
    if next_billing_date <= today {
        return Err(Error::BillingDateNotInFuture(next_billing_date));
    }

    let billing_cycle: BillingCycle = billing_cycle.parse()?;

    match get_category(user_id, category_id, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::InvalidCategory),
        Err(error) => return Err(error),
    }

    Ok(SubscriptionDetails {
        category_id,
        service_name,
        amount,
        billing_cycle,
        next_billing_date,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
