//! HTTP handlers for the dashboard.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Clock, Error,
    dashboard::{
        PeriodFilter, Summary, UpcomingCharge, UpcomingWindow, get_summary, get_upcoming,
    },
    db::lock_connection,
    extract::{Json, Query},
    user::UserID,
};

/// The state needed by the dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The application clock.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// Get the monthly spending summary of the logged in user.
pub async fn get_summary_endpoint(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(filter): Query<PeriodFilter>,
) -> Result<Json<Summary>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_summary(user_id, &filter, state.clock.now(), &connection).map(Json)
}

/// Get the pending charges of the logged in user, by default for the coming week.
pub async fn get_upcoming_endpoint(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(filter): Query<PeriodFilter>,
) -> Result<Json<Vec<UpcomingCharge>>, Error> {
    let window = UpcomingWindow::from_filter(&filter, state.clock.today())?;
    let connection = lock_connection(&state.db_connection)?;

    get_upcoming(user_id, window, &connection).map(Json)
}

#[cfg(test)]
mod dashboard_handler_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::{
        FixedClock,
        category::{CategoryForm, create_category},
        charge::create_charge,
        dashboard::Summary,
        db::test_utils::{TEST_NOW, get_test_connection, insert_test_user},
        subscription::{SubscriptionForm, create_subscription},
    };

    use super::{DashboardState, get_summary_endpoint, get_upcoming_endpoint};

    fn get_test_server() -> TestServer {
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
        let subscription = create_subscription(
            user.id,
            SubscriptionForm {
                category_id: Some(category.id),
                service_name: Some("Netflix".to_owned()),
                amount: Some(29.9),
                billing_cycle: Some("monthly".to_owned()),
                next_billing_date: Some("2025-01-20".to_owned()),
            },
            TEST_NOW,
            &connection,
        )
        .unwrap();
        create_charge(user.id, subscription.id, TEST_NOW, &connection).unwrap();

        let state = DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            clock: Arc::new(FixedClock(TEST_NOW)),
        };
        let app = Router::new()
            .route("/dashboard/summary", get(get_summary_endpoint))
            .route("/dashboard/upcoming", get(get_upcoming_endpoint))
            .layer(Extension(user.id))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn summary_counts_active_subscriptions() {
        let server = get_test_server();

        let summary = server.get("/dashboard/summary").await.json::<Summary>();

        assert_eq!(summary.actives, 1);
        assert!((summary.total_monthly - 29.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn upcoming_includes_service_details() {
        let server = get_test_server();

        let response = server.get("/dashboard/upcoming").await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body[0]["service_name"], "Netflix");
        assert_eq!(body[0]["next_billing_date"], "2025-02-20");
        assert_eq!(body[0]["charge_date"], "2025-01-15");
        assert_eq!(body[0]["status"], "pending");
    }

    #[tokio::test]
    async fn upcoming_outside_window_is_empty() {
        let server = get_test_server();

        let response = server
            .get("/dashboard/upcoming")
            .add_query_param("initial_period", "2025-02-01")
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), Value::Array(vec![]));
    }

    #[tokio::test]
    async fn bad_period_is_bad_request() {
        let server = get_test_server();

        server
            .get("/dashboard/summary")
            .add_query_param("final_period", "tomorrow")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
