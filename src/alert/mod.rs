//! Notifications shown to a user about their subscriptions and charges.

mod core;
mod db;
mod handlers;

pub use core::{list_alerts, mark_alert_read};
pub use db::create_alert_table;
pub(crate) use db::{NewAlert, insert_alert, select_unread_alerts};
pub use handlers::{list_alerts_endpoint, mark_alert_read_endpoint};

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{subscription::SubscriptionId, user::UserID};

/// Database identifier for an alert.
pub type AlertId = i64;

/// What caused an alert to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A message not tied to any event.
    General,
    /// The user canceled a subscription.
    SubscriptionCanceled,
    /// A charge was registered for a subscription.
    ChargeCreated,
    /// A pending charge falls within the coming week.
    UpcomingCharge,
}

impl AlertKind {
    /// The name used for the kind in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::General => "general",
            AlertKind::SubscriptionCanceled => "subscription_canceled",
            AlertKind::ChargeCreated => "charge_created",
            AlertKind::UpcomingCharge => "upcoming_charge",
        }
    }
}

/// The error for text that does not name an [AlertKind].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid alert kind")]
pub struct InvalidAlertKind(String);

impl FromStr for AlertKind {
    type Err = InvalidAlertKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(AlertKind::General),
            "subscription_canceled" => Ok(AlertKind::SubscriptionCanceled),
            "charge_created" => Ok(AlertKind::ChargeCreated),
            "upcoming_charge" => Ok(AlertKind::UpcomingCharge),
            other => Err(InvalidAlertKind(other.to_owned())),
        }
    }
}

impl Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for AlertKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for AlertKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A message for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// The ID of the alert.
    pub id: AlertId,
    /// The user the alert is for.
    pub user_id: UserID,
    /// The text shown to the user.
    pub message: String,
    /// Whether the user has dismissed the alert.
    pub is_read: bool,
    /// When the alert was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// What caused the alert.
    pub kind: AlertKind,
    /// The subscription the alert is about, if any.
    pub subscription_id: Option<SubscriptionId>,
    /// The billing date the alert is about, if any.
    pub billing_date: Option<Date>,
}
