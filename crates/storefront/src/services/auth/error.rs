//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] elegance_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Required profile field left blank.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Reset token unknown, used, or expired.
    #[error("invalid or expired reset token")]
    InvalidResetToken,

    /// Session state missing or invalid.
    #[error("invalid session state")]
    InvalidSessionState,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the error came from bad input rather than a failure.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(
            self,
            Self::Repository(_) | Self::PasswordHash | Self::InvalidSessionState
        )
    }

    /// Message safe to show on the form that caused the error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address".to_owned(),
            Self::InvalidCredentials | Self::UserNotFound => {
                "Invalid email or password".to_owned()
            }
            Self::UserAlreadyExists => "An account with this email already exists".to_owned(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::PasswordMismatch => "Passwords do not match".to_owned(),
            Self::MissingField(field) => format!("Please enter your {field}"),
            Self::InvalidResetToken => {
                "This reset link is invalid or has expired. Please request a new one.".to_owned()
            }
            Self::InvalidSessionState => "Session expired, please try again".to_owned(),
            Self::Repository(_) | Self::PasswordHash => {
                "Something went wrong. Please try again.".to_owned()
            }
        }
    }
}
