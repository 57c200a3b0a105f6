//! Charges made against subscriptions.

mod core;
mod db;
mod handlers;

pub use core::{ChargeFilter, create_charge, list_charges, list_charges_by_subscription, pay_charge};
pub use db::create_charge_table;
pub(crate) use db::select_upcoming_charges;
pub use handlers::{
    create_charge_endpoint, list_charges_endpoint, list_subscription_charges_endpoint,
    pay_charge_endpoint,
};

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, subscription::SubscriptionId};

/// Database identifier for a charge.
pub type ChargeId = i64;

/// Whether a charge has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    /// The charge is waiting to be paid.
    Pending,
    /// The charge has been paid.
    Paid,
}

impl ChargeStatus {
    /// The name used for the status in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeStatus::Pending => "pending",
            ChargeStatus::Paid => "paid",
        }
    }
}

impl FromStr for ChargeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ChargeStatus::Pending),
            "paid" => Ok(ChargeStatus::Paid),
            other => Err(Error::InvalidChargeStatus(other.to_owned())),
        }
    }
}

impl Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for ChargeStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ChargeStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A single bill for a subscription.
///
/// The amount is copied from the subscription when the charge is created and does not
/// change if the subscription is edited later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    /// The ID of the charge.
    pub id: ChargeId,
    /// The subscription that was charged.
    pub subscription_id: SubscriptionId,
    /// The date the charge was made.
    pub charge_date: Date,
    /// The amount charged.
    pub amount: f64,
    /// Whether the charge has been paid.
    pub status: ChargeStatus,
    /// When the charge was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
