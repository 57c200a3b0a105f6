//! Users of the application and their profile settings.

mod core;
mod db;
mod handlers;

pub use core::{UserForm, UserProfile, delete_user, edit_user, get_user_profile};
pub use db::{
    NewUser, create_user, create_user_table, get_user_by_email, get_user_by_id,
};
pub use handlers::{delete_user_endpoint, edit_user_endpoint, get_user_endpoint};

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::PasswordHash;

/// The currency assigned to new users.
pub const DEFAULT_CURRENCY: &str = "BRL";

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email address, always lowercase.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The currency code used when displaying amounts, e.g. "BRL".
    pub currency: String,
    /// Whether the user wants to receive notifications.
    pub notifications_enabled: bool,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}
