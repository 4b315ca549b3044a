//! Wishlist route handlers.
//!
//! Product cards toggle the heart with HTMX; the account wishlist page uses
//! plain form posts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use elegance_core::ProductId;
use elegance_core::cart::CartError;

use super::is_htmx;
use crate::db::{ProductRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, safe_next};
use crate::services::{CartOwner, CartService, CartServiceError};
use crate::state::AppState;
use crate::views::{capitalize_first, redirect_with_error, redirect_with_success};

/// Wishlist action form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: ProductId,
    /// Page to return to for non-HTMX posts.
    pub next: Option<String>,
}

/// Heart toggle button fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: i32,
    pub wishlisted: bool,
}

/// Save a product.
#[instrument(skip(state, user, headers, form), fields(user_id = %user.id, product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(form.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", form.product_id)))?;

    WishlistRepository::new(state.pool())
        .add(user.id, product.id)
        .await?;

    if is_htmx(&headers) {
        return Ok(button(product.id, true));
    }
    let back = safe_back(form.next.as_deref(), &format!("/products/{}", product.slug));
    Ok(redirect_with_success(&back, "Saved to your wishlist.").into_response())
}

/// Remove a saved product.
#[instrument(skip(state, user, headers, form), fields(user_id = %user.id, product_id = %form.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    WishlistRepository::new(state.pool())
        .remove(user.id, form.product_id)
        .await?;

    if is_htmx(&headers) {
        return Ok(button(form.product_id, false));
    }
    let back = safe_back(form.next.as_deref(), "/account/wishlist");
    Ok(redirect_with_success(&back, "Removed from your wishlist.").into_response())
}

/// Add a saved product to the cart and drop it from the wishlist.
///
/// Products that need a size or color send the user to the product page to
/// choose one.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id, product_id = %form.product_id))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(form.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", form.product_id)))?;

    let cart = CartService::new(state.pool(), &session, CartOwner::of(Some(&user)));
    match cart.add(&product, 1, None, None).await {
        Ok(()) => {}
        Err(CartServiceError::Cart(e @ (CartError::SizeRequired | CartError::ColorRequired))) => {
            let back = format!("/products/{}", product.slug);
            return Ok(redirect_with_error(&back, &capitalize_first(&e.to_string())).into_response());
        }
        Err(CartServiceError::Cart(e)) => {
            return Ok(
                redirect_with_error("/account/wishlist", &capitalize_first(&e.to_string()))
                    .into_response(),
            );
        }
        Err(e) => return Err(e.into()),
    }

    WishlistRepository::new(state.pool())
        .remove(user.id, product.id)
        .await?;

    Ok(redirect_with_success("/cart", &format!("{} moved to your cart.", product.name))
        .into_response())
}

fn button(product_id: ProductId, wishlisted: bool) -> Response {
    (
        AppendHeaders([("HX-Trigger", "wishlist-updated")]),
        WishlistButtonTemplate {
            product_id: product_id.as_i32(),
            wishlisted,
        },
    )
        .into_response()
}

/// `next` when given (off-site values fall back to `/account`), otherwise `fallback`.
fn safe_back(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(_) => safe_next(next).to_owned(),
        None => fallback.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_back() {
        assert_eq!(safe_back(None, "/account/wishlist"), "/account/wishlist");
        assert_eq!(safe_back(Some("/products?page=2"), "/x"), "/products?page=2");
        assert_eq!(safe_back(Some("https://evil.test"), "/x"), "/account");
    }
}
