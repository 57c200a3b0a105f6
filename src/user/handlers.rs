//! HTTP handlers for the `/users/me` resource.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    db::lock_connection,
    extract::Json,
    user::{UserForm, UserID, UserProfile, delete_user, edit_user, get_user_profile},
};

/// The state needed by the user profile handlers.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the profile of the logged in user.
pub async fn get_user_endpoint(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<UserProfile>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_user_profile(user_id, &connection).map(Json)
}

/// Update the profile of the logged in user.
pub async fn edit_user_endpoint(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<UserForm>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    edit_user(user_id, form, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete the logged in user and everything they own.
pub async fn delete_user_endpoint(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_user(user_id, &connection)?;
    tracing::info!("Deleted user {user_id}");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod user_handler_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Router,
        http::StatusCode,
        routing::{delete, get, put},
    };
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        db::test_utils::{get_test_connection, insert_test_user},
        user::{UserProfile, get_user_by_id},
    };

    use super::{UserState, delete_user_endpoint, edit_user_endpoint, get_user_endpoint};

    fn get_test_server() -> (TestServer, UserState, crate::UserID) {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);
        let state = UserState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route("/users/me", get(get_user_endpoint))
            .route("/users/me", put(edit_user_endpoint))
            .route("/users/me", delete(delete_user_endpoint))
            .layer(Extension(user.id))
            .with_state(state.clone());

        (
            TestServer::new(app).expect("Could not create test server."),
            state,
            user.id,
        )
    }

    #[tokio::test]
    async fn get_profile_omits_password() {
        let (server, _, user_id) = get_test_server();

        let response = server.get("/users/me").await;

        response.assert_status_ok();
        let body = response.text();
        assert!(!body.contains("password"), "got {body}");
        let profile = response.json::<UserProfile>();
        assert_eq!(profile.id, user_id);
    }

    #[tokio::test]
    async fn edit_profile_returns_no_content() {
        let (server, state, user_id) = get_test_server();

        server
            .put("/users/me")
            .json(&json!({ "name": "Renamed" }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_id(user_id, &connection).unwrap();
        assert_eq!(user.name, "Renamed");
    }

    #[tokio::test]
    async fn deleted_user_profile_is_not_found() {
        let (server, _, _) = get_test_server();

        server
            .delete("/users/me")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get("/users/me")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
