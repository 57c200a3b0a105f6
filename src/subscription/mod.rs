//! Recurring subscriptions and their lifecycle.

mod billing;
mod core;
mod db;
mod handlers;

pub use billing::{add_months, add_years};
pub use core::{
    SubscriptionFilter, SubscriptionForm, cancel_subscription, create_subscription,
    edit_subscription, get_subscription, list_subscriptions,
};
pub(crate) use db::{advance_next_billing_date, get_subscription_by_id};
pub use db::create_subscription_table;
pub use handlers::{
    cancel_subscription_endpoint, create_subscription_endpoint, edit_subscription_endpoint,
    get_subscription_endpoint, list_subscriptions_endpoint,
};

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, category::CategoryId, user::UserID};

/// Database identifier for a subscription.
pub type SubscriptionId = i64;

/// How often a subscription is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    /// Billed once a month.
    Monthly,
    /// Billed once a year.
    Yearly,
}

impl BillingCycle {
    /// The name used for the cycle in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }

    /// The billing date that follows `date`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDate] if the next date is out of the supported range.
    pub fn next_billing_date(&self, date: Date) -> Result<Date, Error> {
        match self {
            BillingCycle::Monthly => add_months(date, 1),
            BillingCycle::Yearly => add_years(date, 1),
        }
    }

    /// Convert `amount`, billed once per cycle, to the amount billed per month.
    pub fn monthly_amount(&self, amount: f64) -> f64 {
        match self {
            BillingCycle::Monthly => amount,
            BillingCycle::Yearly => amount / 12.0,
        }
    }
}

impl FromStr for BillingCycle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(Error::InvalidBillingCycle(other.to_owned())),
        }
    }
}

impl Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for BillingCycle {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for BillingCycle {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// Whether a subscription is still being billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// The subscription is being billed.
    Active,
    /// The subscription was canceled and can no longer be charged.
    Canceled,
}

impl SubscriptionStatus {
    /// The name used for the status in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            other => Err(Error::InvalidSubscriptionStatus(other.to_owned())),
        }
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for SubscriptionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for SubscriptionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A recurring payment for a service, e.g. a streaming platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// The ID of the subscription.
    pub id: SubscriptionId,
    /// The user that owns the subscription.
    pub user_id: UserID,
    /// The category the subscription belongs to.
    pub category_id: CategoryId,
    /// The name of the service, unique for each user.
    pub service_name: String,
    /// The amount billed each cycle.
    pub amount: f64,
    /// How often the subscription is billed.
    pub billing_cycle: BillingCycle,
    /// The date of the next charge.
    pub next_billing_date: Date,
    /// Whether the subscription is still active.
    pub status: SubscriptionStatus,
    /// When the subscription was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
