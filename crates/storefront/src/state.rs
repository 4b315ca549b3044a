//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use elegance_core::catalog::Category;

use crate::config::StorefrontConfig;
use crate::db::{CategoryRepository, RepositoryError};
use crate::services::EmailService;

/// How long the category list is cached.
const CATEGORY_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    email: Option<EmailService>,
    categories: Cache<(), Arc<Vec<Category>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Email is disabled when SMTP isn't configured or the relay can't be set up.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let email = config.email.as_ref().and_then(|email_config| {
            EmailService::new(email_config, &config.store.name)
                .inspect_err(|e| tracing::error!(error = %e, "Failed to configure SMTP, email disabled"))
                .ok()
        });
        if email.is_none() {
            tracing::warn!("Email not configured; reset links will be logged instead of sent");
        }

        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORY_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                categories,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The email service, when SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// All categories, cached for a few minutes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cache is cold and the query fails.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(categories) = self.inner.categories.get(&()).await {
            return Ok(categories);
        }

        let categories = Arc::new(CategoryRepository::new(self.pool()).list().await?);
        self.inner.categories.insert((), Arc::clone(&categories)).await;
        Ok(categories)
    }
}
