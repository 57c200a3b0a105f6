//! Dashboard aggregation.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, Time};

use crate::{
    Error,
    charge::select_upcoming_charges,
    clock::parse_date,
    dashboard::{Summary, UpcomingCharge, db::select_summary},
    user::UserID,
};

/// Query parameters selecting a range of dates.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PeriodFilter {
    /// The first date of the period (`YYYY-MM-DD`).
    pub initial_period: Option<String>,
    /// The last date of the period (`YYYY-MM-DD`), inclusive.
    pub final_period: Option<String>,
}

impl PeriodFilter {
    fn parse(&self) -> Result<(Option<Date>, Option<Date>), Error> {
        let parse = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(parse_date)
                .transpose()
        };

        Ok((parse(&self.initial_period)?, parse(&self.final_period)?))
    }
}

/// An inclusive range of charge dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpcomingWindow {
    /// The first date in the window.
    pub start: Date,
    /// The last date in the window.
    pub end: Date,
}

impl UpcomingWindow {
    /// The number of days after the start date covered by the default window.
    pub const DEFAULT_DAYS: i64 = 7;

    /// The window from `today` to a week from today.
    pub fn week_from(today: Date) -> Self {
        Self {
            start: today,
            end: today.saturating_add(Duration::days(Self::DEFAULT_DAYS)),
        }
    }

    /// Build a window from optional bounds, falling back to a week starting today.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDate] if a bound is not a date.
    pub fn from_filter(filter: &PeriodFilter, today: Date) -> Result<Self, Error> {
        let (start, end) = filter.parse()?;
        let start = start.unwrap_or(today);
        let end = end.unwrap_or_else(|| Self::week_from(start).end);

        Ok(Self { start, end })
    }
}

/// Summarize the active subscriptions of `user_id` created within a period.
///
/// Without any bounds the period runs from the start of the current month until `now`.
/// The final bound includes the whole of its day.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if a bound is not a date.
pub fn get_summary(
    user_id: UserID,
    filter: &PeriodFilter,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Summary, Error> {
    let (start, end) = match filter.parse()? {
        (None, None) => {
            let first_of_month = now.date().replace_day(1).map_err(|_| {
                Error::InvalidDate(now.date().to_string())
            })?;

            (Some(first_of_month.midnight().assume_offset(now.offset())), Some(now))
        }
        (start, end) => (
            start.map(|date| date.midnight().assume_offset(now.offset())),
            end.map(|date| date.with_time(end_of_day()).assume_offset(now.offset())),
        ),
    };

    select_summary(user_id, start, end, connection)
}

/// List the pending charges of the active subscriptions of `user_id` dated within
/// `window`.
pub fn get_upcoming(
    user_id: UserID,
    window: UpcomingWindow,
    connection: &Connection,
) -> Result<Vec<UpcomingCharge>, Error> {
    let upcoming = select_upcoming_charges(user_id, window.start, window.end, connection)?
        .into_iter()
        .map(|(charge, service_name, next_billing_date)| UpcomingCharge {
            charge,
            service_name,
            next_billing_date,
        })
        .collect();

    Ok(upcoming)
}

fn end_of_day() -> Time {
    Time::MIDNIGHT - Duration::MILLISECOND
}

#[cfg(test)]
mod dashboard_core_tests {
    use rusqlite::Connection;
    use time::{Duration, macros::date};

    use crate::{
        Error,
        category::{CategoryForm, CategoryId, create_category},
        charge::{create_charge, pay_charge},
        db::test_utils::{TEST_NOW, get_test_connection, insert_test_user},
        subscription::{
            Subscription, SubscriptionForm, cancel_subscription, create_subscription,
        },
        user::UserID,
    };

    use super::{PeriodFilter, UpcomingWindow, get_summary, get_upcoming};

    fn setup() -> (Connection, UserID, CategoryId) {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);
        let category = create_category(
            user.id,
            CategoryForm {
                name: "Streaming".to_owned(),
                color: None,
            },
            TEST_NOW,
            &connection,
        )
        .unwrap();

        (connection, user.id, category.id)
    }

    fn subscribe(
        connection: &Connection,
        user_id: UserID,
        category_id: CategoryId,
        service_name: &str,
        amount: f64,
        billing_cycle: &str,
        created_at: time::OffsetDateTime,
    ) -> Subscription {
        create_subscription(
            user_id,
            SubscriptionForm {
                category_id: Some(category_id),
                service_name: Some(service_name.to_owned()),
                amount: Some(amount),
                billing_cycle: Some(billing_cycle.to_owned()),
                next_billing_date: Some("2025-02-20".to_owned()),
            },
            created_at,
            connection,
        )
        .unwrap()
    }

    fn assert_close(got: f64, want: f64) {
        assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
    }

    #[test]
    fn summary_without_subscriptions_is_zero() {
        let (connection, user_id, _) = setup();

        let summary = get_summary(user_id, &PeriodFilter::default(), TEST_NOW, &connection);

        assert_eq!(
            summary,
            Ok(crate::Summary {
                total_monthly: 0.0,
                actives: 0,
                avg_amount: 0.0
            })
        );
    }

    #[test]
    fn summary_spreads_yearly_amounts_over_twelve_months() {
        let (connection, user_id, category_id) = setup();
        subscribe(&connection, user_id, category_id, "Prime", 120.0, "yearly", TEST_NOW);
        subscribe(&connection, user_id, category_id, "Netflix", 29.9, "monthly", TEST_NOW);

        let summary =
            get_summary(user_id, &PeriodFilter::default(), TEST_NOW, &connection).unwrap();

        assert_close(summary.total_monthly, 39.9);
        assert_eq!(summary.actives, 2);
        assert_close(summary.avg_amount, 19.95);
    }

    #[test]
    fn summary_ignores_canceled_subscriptions() {
        let (connection, user_id, category_id) = setup();
        let prime = subscribe(&connection, user_id, category_id, "Prime", 120.0, "yearly", TEST_NOW);
        subscribe(&connection, user_id, category_id, "Netflix", 29.9, "monthly", TEST_NOW);
        cancel_subscription(user_id, prime.id, TEST_NOW, &connection).unwrap();

        let summary =
            get_summary(user_id, &PeriodFilter::default(), TEST_NOW, &connection).unwrap();

        assert_close(summary.total_monthly, 29.9);
        assert_eq!(summary.actives, 1);
    }

    #[test]
    fn default_summary_only_counts_this_month() {
        let (connection, user_id, category_id) = setup();
        subscribe(
            &connection,
            user_id,
            category_id,
            "Prime",
            120.0,
            "yearly",
            TEST_NOW - Duration::days(30),
        );
        subscribe(&connection, user_id, category_id, "Netflix", 29.9, "monthly", TEST_NOW);

        let summary =
            get_summary(user_id, &PeriodFilter::default(), TEST_NOW, &connection).unwrap();

        assert_eq!(summary.actives, 1);
        assert_close(summary.total_monthly, 29.9);
    }

    #[test]
    fn summary_final_period_includes_whole_day() {
        let (connection, user_id, category_id) = setup();
        subscribe(
            &connection,
            user_id,
            category_id,
            "Prime",
            120.0,
            "yearly",
            TEST_NOW - Duration::days(30),
        );
        subscribe(&connection, user_id, category_id, "Netflix", 29.9, "monthly", TEST_NOW);

        let summary = get_summary(
            user_id,
            &PeriodFilter {
                initial_period: Some("2024-12-01".to_owned()),
                final_period: Some("2025-01-15".to_owned()),
            },
            TEST_NOW,
            &connection,
        )
        .unwrap();

        assert_eq!(summary.actives, 2);
    }

    #[test]
    fn summary_with_only_final_period() {
        let (connection, user_id, category_id) = setup();
        subscribe(
            &connection,
            user_id,
            category_id,
            "Prime",
            120.0,
            "yearly",
            TEST_NOW - Duration::days(30),
        );
        subscribe(&connection, user_id, category_id, "Netflix", 29.9, "monthly", TEST_NOW);

        let summary = get_summary(
            user_id,
            &PeriodFilter {
                initial_period: None,
                final_period: Some("2025-01-01".to_owned()),
            },
            TEST_NOW,
            &connection,
        )
        .unwrap();

        assert_eq!(summary.actives, 1);
        assert_close(summary.total_monthly, 10.0);
    }

    #[test]
    fn summary_rejects_bad_dates() {
        let (connection, user_id, _) = setup();

        let result = get_summary(
            user_id,
            &PeriodFilter {
                initial_period: Some("last month".to_owned()),
                final_period: None,
            },
            TEST_NOW,
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidDate("last month".to_owned())));
    }

    #[test]
    fn upcoming_lists_pending_charges_in_window() {
        let (connection, user_id, category_id) = setup();
        let netflix = subscribe(&connection, user_id, category_id, "Netflix", 29.9, "monthly", TEST_NOW);
        let spotify = subscribe(&connection, user_id, category_id, "Spotify", 19.9, "monthly", TEST_NOW);
        let paid = create_charge(user_id, netflix.id, TEST_NOW, &connection).unwrap();
        pay_charge(user_id, paid.id, &connection).unwrap();
        let pending = create_charge(user_id, spotify.id, TEST_NOW, &connection).unwrap();
        create_charge(
            user_id,
            netflix.id,
            TEST_NOW + Duration::days(10),
            &connection,
        )
        .unwrap();

        let upcoming =
            get_upcoming(user_id, UpcomingWindow::week_from(TEST_NOW.date()), &connection)
                .unwrap();

        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].charge, pending);
        assert_eq!(upcoming[0].service_name, "Spotify");
        assert_eq!(upcoming[0].next_billing_date, date!(2025 - 03 - 20));
    }

    #[test]
    fn upcoming_skips_canceled_subscriptions() {
        let (connection, user_id, category_id) = setup();
        let netflix = subscribe(&connection, user_id, category_id, "Netflix", 29.9, "monthly", TEST_NOW);
        create_charge(user_id, netflix.id, TEST_NOW, &connection).unwrap();
        cancel_subscription(user_id, netflix.id, TEST_NOW, &connection).unwrap();

        let upcoming =
            get_upcoming(user_id, UpcomingWindow::week_from(TEST_NOW.date()), &connection)
                .unwrap();

        assert!(upcoming.is_empty());
    }

    #[test]
    fn window_defaults_to_a_week() {
        let window =
            UpcomingWindow::from_filter(&PeriodFilter::default(), date!(2025 - 01 - 15)).unwrap();

        assert_eq!(window.start, date!(2025 - 01 - 15));
        assert_eq!(window.end, date!(2025 - 01 - 22));
    }
}
