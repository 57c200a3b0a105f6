//! HTTP handlers for categories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Clock, Error,
    category::{
        Category, CategoryForm, CategoryId, create_category, delete_category, edit_category,
        list_categories,
    },
    db::lock_connection,
    extract::{Json, Path},
    user::UserID,
};

/// The state needed by the category handlers.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The application clock.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// List the categories of the logged in user.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_categories(user_id, &connection).map(Json)
}

/// Create a category for the logged in user.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<CategoryForm>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let category = create_category(user_id, form, state.clock.now(), &connection)?;
    tracing::debug!("Created category {} for user {user_id}", category.id);

    Ok(StatusCode::CREATED)
}

/// Rename a category of the logged in user.
pub async fn edit_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
    Json(form): Json<CategoryForm>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    edit_category(user_id, category_id, form, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a category of the logged in user.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_category(user_id, category_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
