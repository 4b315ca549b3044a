//! Promo code lookups.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::PromoCode;

/// Repository for `promo_codes`.
pub struct PromoCodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromoCodeRepository<'a> {
    /// Create a new promo code repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find an active code. `code` must already be normalized to upper case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, code: &str) -> Result<Option<PromoCode>, RepositoryError> {
        let promo = sqlx::query_as::<_, PromoCode>(
            r"
            SELECT id, code, kind, value, description, is_active
            FROM promo_codes
            WHERE code = $1 AND is_active
            ",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;
        Ok(promo)
    }
}
