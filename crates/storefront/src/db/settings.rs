//! Admin-edited store settings.

use sqlx::PgPool;
use sqlx::types::Json;

use elegance_core::settings::{STORE_SETTINGS_KEY, StoreSettings};

use super::RepositoryError;

/// Read-only access to `store_settings`.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved store settings, if an admin has ever saved them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails or the stored
    /// JSON doesn't match the settings shape.
    pub async fn load(&self) -> Result<Option<StoreSettings>, RepositoryError> {
        let settings = sqlx::query_scalar::<_, Json<StoreSettings>>(
            "SELECT value FROM store_settings WHERE key = $1",
        )
        .bind(STORE_SETTINGS_KEY)
        .fetch_optional(self.pool)
        .await?;
        Ok(settings.map(|Json(s)| s))
    }
}
