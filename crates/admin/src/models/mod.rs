//! Records read by the admin panel.
//!
//! Catalog types ([`Product`](elegance_core::catalog::Product),
//! [`Category`](elegance_core::catalog::Category)) come from `elegance-core`;
//! the rows here carry the joins and aggregates only the admin needs.

pub mod customer;
pub mod order;
pub mod review;
pub mod session;

pub use customer::CustomerRow;
pub use order::{Order, OrderItem, OrderRow};
pub use review::ReviewRow;
pub use session::{CurrentAdmin, keys as session_keys};
