//! Middleware that rejects requests without a valid bearer token.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    AppState, Clock, Error,
    auth::{JwtKeys, decode_token},
};

/// The state needed for the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys used to verify tokens.
    pub jwt_keys: JwtKeys,
    /// The clock used to check token expiry.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The user ID from the token is placed into the request extensions and the request
/// executed normally, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>`
/// to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>()
    else {
        return Err(Error::InvalidToken);
    };

    let claims = decode_token(bearer.token(), state.clock.now(), &state.jwt_keys)?;
    request.extensions_mut().insert(claims.user_id);

    Ok(next.run(request).await)
}
