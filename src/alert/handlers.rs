//! HTTP handlers for alerts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Clock, Error,
    alert::{Alert, AlertId, list_alerts, mark_alert_read},
    db::lock_connection,
    extract::{Json, Path},
    user::UserID,
};

/// The state needed by the alert handlers.
#[derive(Debug, Clone)]
pub struct AlertState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The application clock.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for AlertState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// List the unread alerts of the logged in user.
pub async fn list_alerts_endpoint(
    State(state): State<AlertState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Alert>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_alerts(user_id, state.clock.now(), &connection).map(Json)
}

/// Dismiss an alert of the logged in user.
pub async fn mark_alert_read_endpoint(
    State(state): State<AlertState>,
    Extension(user_id): Extension<UserID>,
    Path(alert_id): Path<AlertId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    mark_alert_read(user_id, alert_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod alert_handler_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Router,
        http::StatusCode,
        routing::{get, patch},
    };
    use axum_test::TestServer;

    use crate::{
        Alert, FixedClock,
        alert::{AlertKind, NewAlert, insert_alert},
        db::test_utils::{TEST_NOW, get_test_connection, insert_test_user},
    };

    use super::{AlertState, list_alerts_endpoint, mark_alert_read_endpoint};

    fn get_test_server() -> TestServer {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);
        insert_alert(
            NewAlert {
                user_id: user.id,
                message: "Welcome!".to_owned(),
                kind: AlertKind::General,
                subscription_id: None,
                billing_date: None,
            },
            TEST_NOW,
            &connection,
        )
        .unwrap();

        let state = AlertState {
            db_connection: Arc::new(Mutex::new(connection)),
            clock: Arc::new(FixedClock(TEST_NOW)),
        };
        let app = Router::new()
            .route("/alerts", get(list_alerts_endpoint))
            .route("/alerts/{alert_id}/read", patch(mark_alert_read_endpoint))
            .layer(Extension(user.id))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn read_alert_disappears_from_list() {
        let server = get_test_server();

        let alerts = server.get("/alerts").await.json::<Vec<Alert>>();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "Welcome!");

        server
            .patch(&format!("/alerts/{}/read", alerts[0].id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let alerts = server.get("/alerts").await.json::<Vec<Alert>>();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn marking_unknown_alert_is_no_content() {
        let server = get_test_server();

        server
            .patch("/alerts/999/read")
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}
