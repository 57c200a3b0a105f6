//! HTTP handlers for subscriptions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Clock, Error,
    db::lock_connection,
    extract::{Json, Path, Query},
    subscription::{
        Subscription, SubscriptionFilter, SubscriptionForm, SubscriptionId, cancel_subscription,
        create_subscription, edit_subscription, get_subscription, list_subscriptions,
    },
    user::UserID,
};

/// The state needed by the subscription handlers.
#[derive(Debug, Clone)]
pub struct SubscriptionState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The application clock.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for SubscriptionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// List the subscriptions of the logged in user.
pub async fn list_subscriptions_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
    Query(filter): Query<SubscriptionFilter>,
) -> Result<Json<Vec<Subscription>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_subscriptions(user_id, filter, &connection).map(Json)
}

/// Get a single subscription of the logged in user.
///
/// Responds with `null` if the user has no such subscription.
pub async fn get_subscription_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<Json<Option<Subscription>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_subscription(user_id, subscription_id, &connection).map(Json)
}

/// Create a subscription for the logged in user.
pub async fn create_subscription_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<SubscriptionForm>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let subscription = create_subscription(user_id, form, state.clock.now(), &connection)?;
    tracing::info!(
        "Created subscription {} ({}) for user {user_id}",
        subscription.id,
        subscription.service_name
    );

    Ok(StatusCode::CREATED)
}

/// Edit a subscription of the logged in user.
pub async fn edit_subscription_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
    Path(subscription_id): Path<SubscriptionId>,
    Json(form): Json<SubscriptionForm>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    edit_subscription(
        user_id,
        subscription_id,
        form,
        state.clock.today(),
        &connection,
    )?;

    Ok(StatusCode::NO_CONTENT)
}

/// Cancel a subscription of the logged in user.
pub async fn cancel_subscription_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    cancel_subscription(user_id, subscription_id, state.clock.now(), &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
