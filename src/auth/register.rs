//! Registering new users.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Clock, Error, PasswordHash, ValidatedPassword,
    auth::{JwtKeys, TokenResponse, encode_token},
    db::lock_connection,
    extract::Json,
    user::{NewUser, User, create_user},
};

/// The state needed for registering a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys used to sign tokens.
    pub jwt_keys: JwtKeys,
    /// How long issued tokens are valid for.
    pub token_duration: Duration,
    /// The application clock.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            clock: state.clock.clone(),
        }
    }
}

/// The data for registering a new user.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The user's display name.
    pub name: Option<String>,
    /// The user's email address.
    pub email: Option<String>,
    /// The user's password in plain text.
    pub password: Option<String>,
}

/// Validate `form` and create the new user.
///
/// `cost` is the bcrypt cost used to hash the password.
///
/// # Errors
///
/// Returns:
/// - [Error::MissingFields] if the name, email or password is missing or blank,
/// - [Error::InvalidEmail] if the email cannot be parsed,
/// - [Error::TooWeak] if the password is easy to guess,
/// - [Error::DuplicateEmail] if the email is already registered.
pub fn register_user(
    form: RegisterForm,
    cost: u32,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    let (Some(name), Some(email), Some(password)) = (
        non_blank(form.name),
        non_blank(form.email),
        form.password.filter(|password| !password.is_empty()),
    ) else {
        return Err(Error::MissingFields("name, email, password".to_owned()));
    };

    let email = email
        .parse::<EmailAddress>()
        .map_err(|_| Error::InvalidEmail(email.clone()))?
        .to_string();
    let password = ValidatedPassword::new(&password, &[&name, &email])?;
    let password_hash = PasswordHash::new(password, cost)?;

    create_user(
        NewUser {
            name,
            email,
            password_hash,
        },
        now,
        connection,
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Register a new user and respond with a token for them.
pub async fn register_endpoint(
    State(state): State<RegistrationState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<TokenResponse>), Error> {
    let now = state.clock.now();
    let user = {
        let connection = lock_connection(&state.db_connection)?;
        register_user(form, PasswordHash::DEFAULT_COST, now, &connection)?
    };

    tracing::info!("Registered user {}", user.id);
    let token = encode_token(user.id, now, state.token_duration, &state.jwt_keys)?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}
