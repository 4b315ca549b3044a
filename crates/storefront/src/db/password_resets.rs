//! Password reset token storage.
//!
//! Only the SHA-256 hash of a token is stored. Tokens are single-use.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use elegance_core::UserId;

use super::RepositoryError;

/// Repository for `password_reset_tokens`.
pub struct PasswordResetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PasswordResetRepository<'a> {
    /// Create a new password reset repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new token, invalidating the user's earlier unused tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE password_reset_tokens SET used_at = NOW() WHERE user_id = $1 AND used_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO password_reset_tokens (token_hash, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Whether the token is unused and unexpired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_valid(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let valid: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM password_reset_tokens
                WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            )
            ",
        )
        .bind(token_hash)
        .fetch_one(self.pool)
        .await?;
        Ok(valid)
    }

    /// Mark a valid token used and return its user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume(&self, token_hash: &str) -> Result<Option<UserId>, RepositoryError> {
        let user_id = sqlx::query_scalar::<_, UserId>(
            r"
            UPDATE password_reset_tokens
            SET used_at = NOW()
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            RETURNING user_id
            ",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;
        Ok(user_id)
    }
}
