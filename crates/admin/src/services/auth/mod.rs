//! Admin authentication service.
//!
//! Admins sign in with the same email and password as their storefront
//! account; only users whose role is `admin` get through.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use sqlx::PgPool;

use elegance_core::{Email, UserRole};

use crate::db::UserRepository;
use crate::models::CurrentAdmin;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Check an email and password and return the admin identity.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AdminAuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AdminAuthError::NotAdmin` if the account isn't an admin.
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentAdmin, AdminAuthError> {
        let email = Email::parse(email)?;

        let login = self
            .users
            .login_by_email(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &login.password_hash)?;

        if !login.admin.is_admin() {
            tracing::warn!(user_id = %login.admin.id, "Non-admin user attempted admin sign-in");
            return Err(AdminAuthError::NotAdmin);
        }

        Ok(login.admin)
    }

    /// Whether a signed-in admin still holds the admin role.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::Repository` if the lookup fails.
    pub async fn is_still_admin(&self, admin: &CurrentAdmin) -> Result<bool, AdminAuthError> {
        Ok(self.users.role(admin.id).await? == Some(UserRole::Admin))
    }
}

/// Verify a password against an Argon2 hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    use super::*;

    #[test]
    fn test_verify_password() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"modest-and-elegant", &salt)
            .map(|h| h.to_string())
            .unwrap_or_default();

        assert!(verify_password("modest-and-elegant", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "plaintext"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_user_messages_do_not_leak_account_state() {
        assert_eq!(
            AdminAuthError::NotAdmin.user_message(),
            AdminAuthError::InvalidCredentials.user_message()
        );
    }
}
