//! Authentication service.
//!
//! Password login, registration, password changes, and reset tokens.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use elegance_core::{Email, UserId};

use crate::db::{PasswordResetRepository, RepositoryError, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// How long a reset link stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Registration form input.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'r> {
    pub first_name: &'r str,
    pub last_name: &'r str,
    pub email: &'r str,
    pub password: &'r str,
    pub confirm_password: &'r str,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    resets: PasswordResetRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            resets: PasswordResetRepository::new(pool),
        }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if a name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch` for bad passwords.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_with_password(&self, form: Registration<'_>) -> Result<User, AuthError> {
        let first_name = form.first_name.trim();
        let last_name = form.last_name.trim();
        if first_name.is_empty() {
            return Err(AuthError::MissingField("first name"));
        }
        if last_name.is_empty() {
            return Err(AuthError::MissingField("last name"));
        }

        let email = Email::parse(form.email)?;
        validate_new_password(form.password, form.confirm_password)?;
        let password_hash = hash_password(form.password)?;

        let user = self
            .users
            .create_with_password(&email, &password_hash, first_name, last_name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a signed-in user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if `current` is wrong.
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch` for bad passwords.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        let stored = self.users.password_hash_by_id(user_id).await.map_err(|e| match e {
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Repository(other),
        })?;
        verify_password(current, &stored)?;
        validate_new_password(new, confirm)?;

        let hash = hash_password(new)?;
        self.users.update_password(user_id, &hash).await?;
        Ok(())
    }

    /// Issue a reset token for the account with this email.
    ///
    /// Returns `None` when no account matches, so callers can respond the same
    /// way either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let email = Email::parse(email)?;
        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        self.resets
            .create(user.id, &hash_token(&token), expires_at)
            .await?;

        Ok(Some((user, token)))
    }

    /// Whether a reset token can still be used.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn reset_token_is_valid(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.resets.is_valid(&hash_token(token)).await?)
    }

    /// Set a new password using a reset token. The token is consumed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown, used, or expired.
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch` for bad passwords.
    pub async fn reset_password(
        &self,
        token: &str,
        new: &str,
        confirm: &str,
    ) -> Result<UserId, AuthError> {
        validate_new_password(new, confirm)?;
        let hash = hash_password(new)?;

        let user_id = self
            .resets
            .consume(&hash_token(token))
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        self.users.update_password(user_id, &hash).await?;
        Ok(user_id)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password strength and confirmation.
fn validate_new_password(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// 32 random bytes, hex encoded.
fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Stored form of a reset token.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_new_password() {
        assert!(matches!(
            validate_new_password("short", "short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_new_password("longenough", "different1"),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(validate_new_password("longenough", "longenough").is_ok());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").ok();
        assert!(hash.is_some());
        let hash = hash.unwrap_or_default();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_tokens_are_unique_and_hashed() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);

        let hashed = hash_token(&a);
        assert_eq!(hashed.len(), 64);
        assert_ne!(hashed, a);
        assert_eq!(hashed, hash_token(&a));
    }
}
