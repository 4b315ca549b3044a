//! Store settings storage.
//!
//! Settings live as one JSON document under [`STORE_SETTINGS_KEY`]. The
//! storefront reads the same row when it starts.

use sqlx::PgPool;
use sqlx::types::Json;

use elegance_core::settings::{STORE_SETTINGS_KEY, StoreSettings};

use super::RepositoryError;

/// Read/write access to `store_settings`.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved store settings, or the defaults if none were ever saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored JSON doesn't
    /// match the settings shape.
    pub async fn load(&self) -> Result<StoreSettings, RepositoryError> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT value FROM store_settings WHERE key = $1",
        )
        .bind(STORE_SETTINGS_KEY)
        .fetch_optional(self.pool)
        .await?;

        value.map_or_else(
            || Ok(StoreSettings::default()),
            |value| {
                serde_json::from_value(value).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid store settings: {e}"))
                })
            },
        )
    }

    /// Insert or replace the store settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, settings: &StoreSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store_settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(STORE_SETTINGS_KEY)
        .bind(Json(settings))
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
