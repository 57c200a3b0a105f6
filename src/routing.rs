//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    alert::{list_alerts_endpoint, mark_alert_read_endpoint},
    auth::{auth_guard, log_in_endpoint, register_endpoint},
    category::{
        create_category_endpoint, delete_category_endpoint, edit_category_endpoint,
        list_categories_endpoint,
    },
    charge::{
        create_charge_endpoint, list_charges_endpoint, list_subscription_charges_endpoint,
        pay_charge_endpoint,
    },
    dashboard::{get_summary_endpoint, get_upcoming_endpoint},
    db::lock_connection,
    endpoints,
    logging::logging_middleware,
    subscription::{
        cancel_subscription_endpoint, create_subscription_endpoint, edit_subscription_endpoint,
        get_subscription_endpoint, list_subscriptions_endpoint,
    },
    user::{delete_user_endpoint, edit_user_endpoint, get_user_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint));

    let protected_routes = Router::new()
        .route(
            endpoints::CURRENT_USER,
            get(get_user_endpoint)
                .put(edit_user_endpoint)
                .delete(delete_user_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(edit_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::SUBSCRIPTIONS,
            get(list_subscriptions_endpoint).post(create_subscription_endpoint),
        )
        .route(
            endpoints::SUBSCRIPTION,
            get(get_subscription_endpoint).put(edit_subscription_endpoint),
        )
        .route(
            endpoints::CANCEL_SUBSCRIPTION,
            patch(cancel_subscription_endpoint),
        )
        .route(
            endpoints::SUBSCRIPTION_CHARGES,
            get(list_subscription_charges_endpoint).post(create_charge_endpoint),
        )
        .route(endpoints::CHARGES, get(list_charges_endpoint))
        .route(endpoints::PAY_CHARGE, patch(pay_charge_endpoint))
        .route(endpoints::DASHBOARD_SUMMARY, get(get_summary_endpoint))
        .route(endpoints::DASHBOARD_UPCOMING, get(get_upcoming_endpoint))
        .route(endpoints::ALERTS, get(list_alerts_endpoint))
        .route(endpoints::READ_ALERT, patch(mark_alert_read_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Check that the server can reach its database.
async fn get_health(State(state): State<AppState>) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        connection
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(Into::into)
    });

    match result {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "UP", "message": "Database connection is healthy." })),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Health check failed: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "DOWN", "message": "Database connection failed." })),
            )
                .into_response()
        }
    }
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
        .into_response()
}
