//! Database operations for the admin panel.
//!
//! The admin works on the same database as the storefront, whose migrations
//! create every table used here.
//!
//! ## Tables
//!
//! - `products`, `categories` - Catalog editing and stock
//! - `orders`, `order_items` - Fulfilment and status changes
//! - `users` - Customer list and admin login
//! - `reviews` - Moderation
//! - `store_settings` - Store name, contact email, shipping and tax (JSONB)
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p elegance-cli -- migrate
//! ```

pub mod analytics;
pub mod categories;
pub mod customers;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::{
    AnalyticsRepository, CategorySales, DashboardTotals, MonthlyCount, MonthlyRevenue, StatusCount,
    TopProduct,
};
pub use categories::{CategoryFields, CategoryRepository, CategoryRow};
pub use customers::{CustomerFilter, CustomerRepository};
pub use orders::{OrderFilter, OrderRepository, StatusChangeError};
pub use products::{
    InventoryCounts, ProductAdminFilter, ProductFields, ProductRepository, ProductRow, ProductStatus,
};
pub use reviews::ReviewRepository;
pub use settings::SettingsRepository;
pub use users::{AdminLogin, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-violation into `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%term%` with LIKE wildcards in `term` escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("abaya"), "abaya");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
    }
}
