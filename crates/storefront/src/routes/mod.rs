//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//!
//! # Products
//! GET  /products                  - Catalog with filters, sort, pagination
//! GET  /products/{slug}           - Product detail
//! POST /products/{slug}/reviews   - Submit a review (requires auth)
//!
//! # Cart (HTMX fragments, redirects without HTMX)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add to cart (triggers cart-updated)
//! POST /cart/update               - Update quantity (returns cart_items fragment)
//! POST /cart/remove               - Remove line (returns cart_items fragment)
//! POST /cart/clear                - Empty the cart
//! GET  /cart/count                - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout                  - Checkout form
//! POST /checkout                  - Place order
//! GET  /checkout/summary          - Order summary for a shipping method (fragment)
//! POST /checkout/promo            - Apply promo code
//! POST /checkout/promo/remove     - Remove promo code
//! GET  /checkout/success/{id}     - Order confirmation
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! GET  /auth/register             - Register page
//! POST /auth/register             - Register action
//! POST /auth/logout               - Logout action
//! GET  /auth/forgot-password      - Request a reset link
//! POST /auth/forgot-password      - Send the reset link
//! GET  /auth/reset-password       - New password form (?token=)
//! POST /auth/reset-password       - Set the new password
//!
//! # Account (requires auth)
//! GET  /account                   - Dashboard
//! GET  /account/orders            - Order history (?status=&from=&to=)
//! GET  /account/orders/{id}       - Order detail
//! POST /account/orders/{id}/cancel
//! POST /account/orders/{id}/reorder
//! GET  /account/profile           - Profile form
//! POST /account/profile           - Save profile
//! POST /account/password          - Change password
//! GET  /account/addresses         - Saved addresses
//! POST /account/addresses         - Create address
//! GET  /account/addresses/new
//! GET  /account/addresses/{id}/edit
//! POST /account/addresses/{id}    - Update address
//! POST /account/addresses/{id}/default
//! POST /account/addresses/{id}/delete
//! GET  /account/wishlist          - Saved products
//! POST /account/delete            - Delete account
//!
//! # Wishlist (requires auth)
//! POST /wishlist/add
//! POST /wishlist/remove
//! POST /wishlist/move-to-cart
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Whether the request was made by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Create the auth routes router.
///
/// Form submissions are rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", get(auth::forgot_password_page))
        .route("/reset-password", get(auth::reset_password_page))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
        .route(
            "/{slug}/reviews",
            post(products::submit_review).route_layer(form_rate_limiter()),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route_layer(form_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .merge(limited)
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/", post(checkout::place_order))
        .route("/promo", post(checkout::apply_promo))
        .route("/promo/remove", post(checkout::remove_promo))
        .route_layer(form_rate_limiter());

    Router::new()
        .route("/", get(checkout::show))
        .route("/summary", get(checkout::summary))
        .route("/success/{id}", get(checkout::success))
        .merge(limited)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order_detail))
        .route("/orders/{id}/cancel", post(account::cancel_order))
        .route("/orders/{id}/reorder", post(account::reorder))
        .route(
            "/profile",
            get(account::profile).post(account::update_profile),
        )
        .route(
            "/password",
            post(account::change_password).route_layer(auth_rate_limiter()),
        )
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/new", get(account::new_address))
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/edit", get(account::edit_address))
        .route("/addresses/{id}/default", post(account::set_default_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
        .route("/wishlist", get(account::wishlist))
        .route("/delete", post(account::delete_account))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/move-to-cart", post(wishlist::move_to_cart))
        .route_layer(form_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout
        .nest("/checkout", checkout_routes())
        // Account routes (handlers require auth)
        .nest("/account", account_routes())
        .nest("/wishlist", wishlist_routes())
        // Auth routes
        .nest("/auth", auth_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
        headers.insert("hx-request", HeaderValue::from_static("false"));
        assert!(!is_htmx(&headers));
    }
}
