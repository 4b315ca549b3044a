//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness check
//! GET  /health/ready                 - Readiness check (database)
//!
//! # Auth
//! GET  /auth/login                   - Login page
//! POST /auth/login                   - Email/password login (admin role only)
//! POST /auth/logout                  - Logout
//!
//! # Dashboard
//! GET  /                             - Totals, recent orders, low stock
//!
//! # Products
//! GET  /products                     - List (?search=&category=&status=&page=)
//! GET  /products/new                 - New product form
//! POST /products                     - Create
//! GET  /products/{id}/edit           - Edit form
//! POST /products/{id}                - Update
//! POST /products/{id}/toggle         - Activate/deactivate
//! POST /products/{id}/delete         - Delete
//!
//! # Orders
//! GET  /orders                       - List (?search=&status=&from=&to=&page=)
//! GET  /orders/{id}                  - Detail
//! POST /orders/{id}/status           - Change status
//!
//! # Customers
//! GET  /customers                    - List (?search=&page=)
//! GET  /customers/{id}               - Detail with order history
//!
//! # Categories
//! GET  /categories                   - List with product counts
//! GET  /categories/new               - New category form
//! POST /categories                   - Create
//! GET  /categories/{id}/edit         - Edit form
//! POST /categories/{id}              - Update
//! POST /categories/{id}/delete       - Delete
//!
//! # Inventory
//! GET  /inventory                    - Stock levels (?search=&stock=&page=)
//! POST /inventory/{id}               - Set stock quantity
//!
//! # Reviews
//! GET  /reviews                      - Moderation queue (?status=&page=)
//! POST /reviews/{id}/approve
//! POST /reviews/{id}/reject
//! POST /reviews/{id}/delete
//!
//! # Analytics
//! GET  /analytics                    - Revenue, orders, products, sign-ups
//!
//! # Settings
//! GET  /settings                     - Store settings form
//! POST /settings                     - Save store settings
//! ```

pub mod analytics;
pub mod auth;
pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;

use axum::Router;

use crate::state::AppState;

/// Page size for admin list tables.
pub const PER_PAGE: u32 = 20;

/// Build the complete admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(customers::router())
        .merge(categories::router())
        .merge(inventory::router())
        .merge(reviews::router())
        .merge(analytics::router())
        .merge(settings::router())
}
