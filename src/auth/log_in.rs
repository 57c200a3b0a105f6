//! Logging in with an email and password.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, State};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Clock, Error,
    auth::{JwtKeys, TokenResponse, encode_token},
    db::lock_connection,
    extract::Json,
    user::{User, get_user_by_email},
};

/// The state needed for logging in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys used to sign tokens.
    pub jwt_keys: JwtKeys,
    /// How long issued tokens are valid for.
    pub token_duration: Duration,
    /// The application clock.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            clock: state.clock.clone(),
        }
    }
}

/// The credentials entered when logging in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInForm {
    /// Email entered during log in.
    pub email: String,
    /// Password entered during log in.
    pub password: String,
}

/// Check `form` against the stored credentials.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is not registered or the password
/// is wrong, or [Error::HashingError] if the password could not be verified.
pub fn log_in(form: &LogInForm, connection: &Connection) -> Result<User, Error> {
    let user = match get_user_by_email(form.email.trim(), connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    if user.password_hash.verify(&form.password)? {
        Ok(user)
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// Log in a user and respond with a token for them.
pub async fn log_in_endpoint(
    State(state): State<LogInState>,
    Json(form): Json<LogInForm>,
) -> Result<Json<TokenResponse>, Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;
        log_in(&form, &connection)?
    };

    let token = encode_token(
        user.id,
        state.clock.now(),
        state.token_duration,
        &state.jwt_keys,
    )?;

    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        Error, FixedClock, PasswordHash, ValidatedPassword,
        auth::{DEFAULT_TOKEN_DURATION, JwtKeys, TokenResponse, decode_token},
        db::test_utils::{TEST_NOW, get_test_connection},
        user::{NewUser, create_user},
    };

    use super::{LogInForm, LogInState, log_in, log_in_endpoint};

    const PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_state() -> LogInState {
        let connection = get_test_connection();
        create_user(
            NewUser {
                name: "Foo".to_owned(),
                email: "foo@bar.baz".to_owned(),
                password_hash: PasswordHash::new(
                    ValidatedPassword::new(PASSWORD, &[]).unwrap(),
                    4,
                )
                .unwrap(),
            },
            TEST_NOW,
            &connection,
        )
        .unwrap();

        LogInState {
            db_connection: Arc::new(Mutex::new(connection)),
            jwt_keys: JwtKeys::new("foobar"),
            token_duration: DEFAULT_TOKEN_DURATION,
            clock: Arc::new(FixedClock(TEST_NOW)),
        }
    }

    #[test]
    fn log_in_with_wrong_password_fails() {
        let state = get_test_state();
        let connection = state.db_connection.lock().unwrap();

        let result = log_in(
            &LogInForm {
                email: "foo@bar.baz".to_owned(),
                password: "wrongpassword".to_owned(),
            },
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCredentials));
    }

    #[test]
    fn log_in_with_unknown_email_fails() {
        let state = get_test_state();
        let connection = state.db_connection.lock().unwrap();

        let result = log_in(
            &LogInForm {
                email: "bar@baz.qux".to_owned(),
                password: PASSWORD.to_owned(),
            },
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCredentials));
    }

    #[tokio::test]
    async fn log_in_endpoint_returns_token() {
        let state = get_test_state();
        let app = Router::new()
            .route("/auth/login", post(log_in_endpoint))
            .with_state(state.clone());
        let server = TestServer::new(app).expect("Could not create test server.");

        let response = server
            .post("/auth/login")
            .json(&json!({ "email": "FOO@bar.baz", "password": PASSWORD }))
            .await;

        response.assert_status_ok();
        let token = response.json::<TokenResponse>().token;
        let claims = decode_token(&token, TEST_NOW, &state.jwt_keys).unwrap();
        assert_eq!(claims.exp, (TEST_NOW + DEFAULT_TOKEN_DURATION).unix_timestamp());
    }

    #[tokio::test]
    async fn log_in_endpoint_rejects_bad_credentials() {
        let app = Router::new()
            .route("/auth/login", post(log_in_endpoint))
            .with_state(get_test_state());
        let server = TestServer::new(app).expect("Could not create test server.");

        server
            .post("/auth/login")
            .json(&json!({ "email": "foo@bar.baz", "password": "nope" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
