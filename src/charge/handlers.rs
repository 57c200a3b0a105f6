//! HTTP handlers for charges.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Clock, Error,
    charge::{
        Charge, ChargeFilter, ChargeId, create_charge, list_charges, list_charges_by_subscription,
        pay_charge,
    },
    db::lock_connection,
    extract::{Json, Path, Query},
    subscription::{SubscriptionId, get_subscription_by_id},
    user::UserID,
};

/// The state needed by the charge handlers.
#[derive(Debug, Clone)]
pub struct ChargeState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The application clock.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for ChargeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// List the charges of the logged in user.
pub async fn list_charges_endpoint(
    State(state): State<ChargeState>,
    Extension(user_id): Extension<UserID>,
    Query(filter): Query<ChargeFilter>,
) -> Result<Json<Vec<Charge>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_charges(user_id, filter, &connection).map(Json)
}

/// List the charges of one of the logged in user's subscriptions.
pub async fn list_subscription_charges_endpoint(
    State(state): State<ChargeState>,
    Extension(user_id): Extension<UserID>,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<Json<Vec<Charge>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    if get_subscription_by_id(user_id, subscription_id, &connection)?.is_none() {
        return Err(Error::SubscriptionNotFound);
    }

    list_charges_by_subscription(subscription_id, &connection).map(Json)
}

/// Charge one of the logged in user's subscriptions.
pub async fn create_charge_endpoint(
    State(state): State<ChargeState>,
    Extension(user_id): Extension<UserID>,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    create_charge(user_id, subscription_id, state.clock.now(), &connection)?;

    Ok(StatusCode::CREATED)
}

/// Pay one of the logged in user's charges.
pub async fn pay_charge_endpoint(
    State(state): State<ChargeState>,
    Extension(user_id): Extension<UserID>,
    Path(charge_id): Path<ChargeId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    pay_charge(user_id, charge_id, &connection)?;
    tracing::info!("User {user_id} paid charge {charge_id}");

    Ok(StatusCode::NO_CONTENT)
}
