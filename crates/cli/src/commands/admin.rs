//! Admin access commands.
//!
//! Admins are ordinary accounts with the `admin` role, so the account must
//! be registered on the storefront first.
//!
//! ```bash
//! el-cli admin promote -e owner@example.com
//! el-cli admin demote -e owner@example.com
//! ```

use elegance_admin::db::{self, RepositoryError, UserRepository};
use elegance_core::{Email, UserRole};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No account found with email: {0} (register on the storefront first)")]
    UserNotFound(String),

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Grant the admin role.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has this email.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    set_role(email, UserRole::Admin).await
}

/// Return an account to the customer role. Sessions pick this up on their
/// next request.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has this email.
pub async fn demote(email: &str) -> Result<(), AdminError> {
    set_role(email, UserRole::Customer).await
}

async fn set_role(email: &str, role: UserRole) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let user_id = UserRepository::new(&pool)
        .set_role(&email, role)
        .await?
        .ok_or_else(|| AdminError::UserNotFound(email.to_string()))?;

    tracing::info!(%user_id, %email, %role, "Role updated");
    Ok(())
}
