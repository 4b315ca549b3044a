//! Domain models for the storefront.
//!
//! Catalog and pricing types live in `elegance-core`; these are the
//! records that only the storefront reads or writes.

pub mod address;
pub mod order;
pub mod promo;
pub mod review;
pub mod session;
pub mod user;

pub use address::SavedAddress;
pub use order::{Order, OrderItem, OrderSummary};
pub use promo::PromoCode;
pub use review::Review;
pub use session::{CurrentUser, keys};
pub use user::User;
