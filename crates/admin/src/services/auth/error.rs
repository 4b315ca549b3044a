//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] elegance_core::EmailError),

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The password was right but the account isn't an admin.
    #[error("user is not an admin")]
    NotAdmin,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AdminAuthError {
    /// Message safe to show on the login form.
    ///
    /// Unknown accounts, wrong passwords and non-admin accounts all read the
    /// same so the form doesn't reveal which emails are registered.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address",
            Self::InvalidCredentials | Self::NotAdmin => "Invalid email or password",
            Self::Repository(_) => "Something went wrong. Please try again.",
        }
    }
}
