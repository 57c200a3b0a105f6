//! Profile rules for users.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    user::{
        User, UserID,
        db::{delete_user_row, get_user_by_id, update_user_profile},
    },
};

/// The public view of a user, which never includes the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's ID.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email address.
    pub email: String,
    /// The currency code used when displaying amounts.
    pub currency: String,
    /// Whether the user wants to receive notifications.
    pub notifications_enabled: bool,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            currency: user.currency,
            notifications_enabled: user.notifications_enabled,
            created_at: user.created_at,
        }
    }
}

/// The profile fields a user may change. Omitted fields keep their current value.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserForm {
    /// The new display name.
    pub name: Option<String>,
    /// The new currency code.
    pub currency: Option<String>,
    /// Whether notifications should be sent.
    pub notifications_enabled: Option<bool>,
}

/// Get the profile of the user `user_id`.
///
/// # Errors
///
/// Returns [Error::UserNotFound] if the user does not exist.
pub fn get_user_profile(user_id: UserID, connection: &Connection) -> Result<UserProfile, Error> {
    match get_user_by_id(user_id, connection) {
        Ok(user) => Ok(user.into()),
        Err(Error::NotFound) => Err(Error::UserNotFound),
        Err(error) => Err(error),
    }
}

/// Update the profile of the user `user_id`.
///
/// Blank or omitted fields fall back to the user's current values.
///
/// # Errors
///
/// Returns [Error::UserNotFound] if the user does not exist.
pub fn edit_user(user_id: UserID, form: UserForm, connection: &Connection) -> Result<(), Error> {
    let user = match get_user_by_id(user_id, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::UserNotFound),
        Err(error) => return Err(error),
    };

    let name = form
        .name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or(user.name);
    let currency = form
        .currency
        .map(|currency| currency.trim().to_uppercase())
        .filter(|currency| !currency.is_empty())
        .unwrap_or(user.currency);
    let notifications_enabled = form
        .notifications_enabled
        .unwrap_or(user.notifications_enabled);

    update_user_profile(user_id, &name, &currency, notifications_enabled, connection)?;

    Ok(())
}

/// Delete the user `user_id`, their categories, subscriptions, charges and alerts.
///
/// Deleting a user that does not exist is not an error.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = delete_user_row(user_id, connection)?;

    if rows_deleted == 0 {
        tracing::debug!("Tried to delete user {user_id} but they do not exist.");
    }

    Ok(())
}
