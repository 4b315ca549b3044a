//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use elegance_core::{Email, UserId, UserRole};

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// The admin's row in `users`.
    pub id: UserId,
    pub email: Email,
    /// Full name, or the email when no name is on file.
    pub name: String,
    pub role: UserRole,
}

impl CurrentAdmin {
    /// Whether this identity may use the admin panel.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
