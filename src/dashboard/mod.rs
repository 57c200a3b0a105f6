//! Aggregated views over a user's subscriptions and charges.

mod core;
mod db;
mod handlers;

pub use core::{PeriodFilter, UpcomingWindow, get_summary, get_upcoming};
pub use handlers::{get_summary_endpoint, get_upcoming_endpoint};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::charge::Charge;

/// Monthly spending over a user's active subscriptions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// The sum of the monthly amounts, where yearly subscriptions count a twelfth of
    /// their amount.
    pub total_monthly: f64,
    /// The number of active subscriptions.
    pub actives: i64,
    /// The average monthly amount per subscription.
    pub avg_amount: f64,
}

/// A pending charge along with details of its subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingCharge {
    /// The pending charge.
    #[serde(flatten)]
    pub charge: Charge,
    /// The name of the subscribed service.
    pub service_name: String,
    /// The next billing date of the subscription.
    pub next_billing_date: Date,
}
