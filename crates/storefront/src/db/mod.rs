//! Database operations for the storefront.
//!
//! # Tables
//!
//! - `categories`, `products`, `reviews` - Catalog
//! - `users`, `password_reset_tokens` - Site accounts
//! - `cart_items`, `wishlist_items`, `addresses` - Per-customer data
//! - `orders`, `order_items`, `promo_codes` - Checkout
//! - `store_settings` - Admin overrides for name and pricing
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p elegance-cli -- migrate
//! ```

pub mod addresses;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod password_resets;
pub mod products;
pub mod promo_codes;
pub mod reviews;
pub mod settings;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::{AddressFields, AddressRepository};
pub use cart::CartRepository;
pub use categories::CategoryRepository;
pub use orders::{NewOrder, OrderHistoryFilter, OrderRepository};
pub use password_resets::PasswordResetRepository;
pub use products::ProductRepository;
pub use promo_codes::PromoCodeRepository;
pub use reviews::{NewReview, ReviewRepository};
pub use settings::SettingsRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in database is invalid or corrupted.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested record was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A product had less stock than an order line requested.
    #[error("insufficient stock for {0}")]
    InsufficientStock(String),
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

/// Create a `PostgreSQL` connection pool with sensible defaults.
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
