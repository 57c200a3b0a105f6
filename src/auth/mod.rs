//! Bearer token authentication.
//!
//! Users receive a JSON Web Token when they register or log in. The token carries the
//! user's ID and is checked by [auth_guard] on every protected route.

mod log_in;
mod middleware;
mod register;

pub use log_in::log_in_endpoint;
pub use middleware::auth_guard;
pub use register::{RegisterForm, register_endpoint, register_user};

use std::fmt::Debug;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// How long a token is valid for after it is issued.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(7);

/// The keys used to sign and verify tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Derive the signing keys from a `secret` string.
    pub fn new(secret: &str) -> Self {
        let hash = Sha512::digest(secret);

        Self {
            encoding_key: EncodingKey::from_secret(&hash),
            decoding_key: DecodingKey::from_secret(&hash),
        }
    }
}

impl Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys { .. }")
    }
}

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// The expiry time of the token as a unix timestamp.
    pub exp: i64,
    /// The time the token was issued as a unix timestamp.
    pub iat: i64,
}

/// The response body for a successful registration or log in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The bearer token to send with subsequent requests.
    pub token: String,
}

/// Issue a token for `user_id` that expires `duration` after `now`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    now: OffsetDateTime,
    duration: Duration,
    keys: &JwtKeys,
) -> Result<String, Error> {
    let claims = Claims {
        user_id,
        exp: (now + duration).unix_timestamp(),
        iat: now.unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify `token` and return its claims.
///
/// Expiry is checked against `now` rather than the system time so that the
/// application clock decides when a token is stale.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the signature is wrong, the token is malformed
/// or the token has expired.
pub fn decode_token(token: &str, now: OffsetDateTime, keys: &JwtKeys) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    let claims = decode::<Claims>(token, &keys.decoding_key, &validation)
        .map_err(|error| {
            tracing::debug!("rejected token: {error}");
            Error::InvalidToken
        })?
        .claims;

    if claims.exp <= now.unix_timestamp() {
        return Err(Error::InvalidToken);
    }

    Ok(claims)
}

#[cfg(test)]
mod token_tests {
    use time::Duration;

    use crate::{Error, db::test_utils::TEST_NOW, user::UserID};

    use super::{DEFAULT_TOKEN_DURATION, JwtKeys, decode_token, encode_token};

    #[test]
    fn decoded_token_has_user_id() {
        let keys = JwtKeys::new("foobar");
        let user_id = UserID::new(42);

        let token = encode_token(user_id, TEST_NOW, DEFAULT_TOKEN_DURATION, &keys).unwrap();
        let claims = decode_token(&token, TEST_NOW, &keys).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.iat, TEST_NOW.unix_timestamp());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = encode_token(
            UserID::new(1),
            TEST_NOW,
            DEFAULT_TOKEN_DURATION,
            &JwtKeys::new("foobar"),
        )
        .unwrap();

        let result = decode_token(&token, TEST_NOW, &JwtKeys::new("bazqux"));

        assert_eq!(result, Err(Error::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new("foobar");
        let token = encode_token(UserID::new(1), TEST_NOW, Duration::minutes(5), &keys).unwrap();

        let result = decode_token(&token, TEST_NOW + Duration::minutes(5), &keys);

        assert_eq!(result, Err(Error::InvalidToken));
    }

    #[test]
    fn garbage_is_rejected() {
        let result = decode_token("not.a.token", TEST_NOW, &JwtKeys::new("foobar"));

        assert_eq!(result, Err(Error::InvalidToken));
    }
}
