//! Subtrack is a backend for keeping track of recurring subscriptions.
//!
//! Users register, group their subscriptions into categories, record the
//! charges made against each subscription and receive alerts about charges
//! that were processed or are coming up.
//!
//! This library provides a JSON REST API served with axum and backed by SQLite.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod charge;
mod clock;
mod dashboard;
pub mod db;
pub mod endpoints;
mod extract;
mod logging;
mod password;
mod routing;
mod subscription;
mod user;

pub use alert::{Alert, AlertId, AlertKind};
pub use app_state::AppState;
pub use auth::{DEFAULT_TOKEN_DURATION, JwtKeys, RegisterForm, register_user};
pub use category::{Category, CategoryForm, CategoryId, CategoryName, create_category};
pub use charge::{Charge, ChargeId, ChargeStatus, create_charge, pay_charge};
pub use clock::{Clock, FixedClock, SystemClock};
pub use dashboard::{Summary, UpcomingCharge};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use subscription::{
    BillingCycle, Subscription, SubscriptionForm, SubscriptionId, SubscriptionStatus,
    create_subscription,
};
pub use user::{User, UserID};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more of the fields needed to create a record were not provided.
    #[error("all fields are required: {0}")]
    MissingFields(String),

    /// The request body, query string or path could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An empty (or whitespace only) string was used as a name.
    #[error("the name cannot be empty")]
    EmptyName,

    /// The amount of a subscription must be a positive, finite number.
    #[error("the amount must be greater than zero, got {0}")]
    InvalidAmount(f64),

    /// A date string could not be parsed as a calendar date (`YYYY-MM-DD`).
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The next billing date of a subscription must be after today.
    #[error("the next billing date {0} must be a date in the future")]
    BillingDateNotInFuture(Date),

    /// The billing cycle was not one of the supported cycles.
    #[error("\"{0}\" is not a valid billing cycle, expected \"monthly\" or \"yearly\"")]
    InvalidBillingCycle(String),

    /// The subscription status filter was not one of the supported statuses.
    #[error("\"{0}\" is not a valid subscription status, expected \"active\" or \"canceled\"")]
    InvalidSubscriptionStatus(String),

    /// The charge status filter was not one of the supported statuses.
    #[error("\"{0}\" is not a valid charge status, expected \"pending\" or \"paid\"")]
    InvalidChargeStatus(String),

    /// The category used for a subscription does not belong to the user.
    #[error("the category does not exist")]
    InvalidCategory,

    /// The email address could not be parsed.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// Tried to pay a charge that has already been paid.
    #[error("the charge has already been paid")]
    ChargeAlreadyPaid,

    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The bearer token was missing, malformed or expired.
    #[error("missing or invalid token")]
    InvalidToken,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The subscription does not exist or belongs to another user.
    #[error("the subscription could not be found")]
    SubscriptionNotFound,

    /// The charge does not exist or belongs to another user.
    #[error("the charge could not be found")]
    ChargeNotFound,

    /// The user does not exist.
    #[error("the user could not be found")]
    UserNotFound,

    /// The email address is already registered.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The user already has a category with this name.
    #[error("a category named \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The user already has a subscription with this service name.
    #[error("a subscription named \"{0}\" already exists")]
    DuplicateSubscriptionName(String),

    /// Tried to delete a category that subscriptions still refer to.
    #[error("the category is used by one or more subscriptions")]
    CategoryInUse,

    /// A query was given an id that does not refer to an existing row.
    #[error("a referenced record does not exist")]
    InvalidForeignKey,

    /// The row changed between reading it and writing it back.
    #[error("the record was modified by another request, try again")]
    ConcurrentUpdate,

    /// Tried to charge a canceled subscription.
    #[error("the subscription has been canceled")]
    SubscriptionCanceled,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A JSON Web Token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl Error {
    /// The HTTP status code a client receives for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFields(_)
            | Error::InvalidRequest(_)
            | Error::EmptyName
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_)
            | Error::BillingDateNotInFuture(_)
            | Error::InvalidBillingCycle(_)
            | Error::InvalidSubscriptionStatus(_)
            | Error::InvalidChargeStatus(_)
            | Error::InvalidCategory
            | Error::InvalidEmail(_)
            | Error::TooWeak(_)
            | Error::InvalidForeignKey
            | Error::ChargeAlreadyPaid => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::NotFound
            | Error::SubscriptionNotFound
            | Error::ChargeNotFound
            | Error::UserNotFound => StatusCode::NOT_FOUND,
            Error::DuplicateEmail
            | Error::DuplicateCategoryName(_)
            | Error::DuplicateSubscriptionName(_)
            | Error::CategoryInUse
            | Error::ConcurrentUpdate => StatusCode::CONFLICT,
            Error::SubscriptionCanceled => StatusCode::UNPROCESSABLE_ENTITY,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::InvalidForeignKey
            }
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal details are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
