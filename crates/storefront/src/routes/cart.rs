//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every handler also works as a plain form post, answering with a redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use elegance_core::ProductId;
use elegance_core::cart::{CartLine, CartSummary};
use elegance_core::pricing::PricingConfig;

use super::is_htmx;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::{CartOwner, CartService, CartServiceError};
use crate::state::AppState;
use crate::views::{Layout, capitalize_first, redirect_with_error, redirect_with_success};

// =============================================================================
// View types
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub key: String,
    pub slug: String,
    pub name: String,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub regular_price: Option<String>,
    pub line_total: String,
    pub available: bool,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            key: line.key.clone(),
            slug: line.product.slug.clone(),
            name: line.product.name.clone(),
            image: line.product.primary_image().map(ToOwned::to_owned),
            size: line.size.clone(),
            color: line.color.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price().to_string(),
            regular_price: line
                .product
                .is_on_sale()
                .then(|| line.product.price.to_string()),
            line_total: line.line_total().to_string(),
            available: line.is_available(),
        }
    }
}

/// Order summary display data for templates.
#[derive(Debug, Clone)]
pub struct SummaryView {
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
    /// "Add $X more for free shipping" amount.
    pub until_free_shipping: Option<String>,
}

impl SummaryView {
    #[must_use]
    pub fn new(lines: &[CartLine], pricing: &PricingConfig) -> Self {
        let summary = CartSummary::new(lines, pricing);
        let totals = summary.totals;
        Self {
            item_count: totals.item_count,
            subtotal: totals.subtotal.to_string(),
            shipping: if totals.shipping.is_zero() {
                "Free".to_owned()
            } else {
                totals.shipping.to_string()
            },
            tax: totals.tax.to_string(),
            total: totals.total.to_string(),
            until_free_shipping: summary.until_free_shipping.map(|m| m.to_string()),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub key: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub key: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub lines: Vec<CartLineView>,
    pub summary: SummaryView,
    pub has_unavailable: bool,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub lines: Vec<CartLineView>,
    pub summary: SummaryView,
    pub has_unavailable: bool,
}

/// "Added to cart" confirmation fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_added.html")]
pub struct CartAddedTemplate {
    pub name: String,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, layout, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    layout: Layout,
) -> Result<CartShowTemplate> {
    let lines = CartService::new(state.pool(), &session, CartOwner::of(user.as_ref()))
        .lines()
        .await?;

    Ok(CartShowTemplate {
        layout,
        summary: SummaryView::new(&lines, &state.config().store.pricing),
        has_unavailable: lines.iter().any(|l| !l.is_available()),
        lines: lines.iter().map(CartLineView::from).collect(),
    })
}

/// Add item to cart.
///
/// HTMX requests get a confirmation fragment plus an `HX-Trigger` so the
/// header badge refreshes; plain posts are redirected back to the product.
#[instrument(skip(state, session, user, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(form.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", form.product_id)))?;

    let cart = CartService::new(state.pool(), &session, CartOwner::of(user.as_ref()));
    let back = format!("/products/{}", product.slug);

    match cart
        .add(
            &product,
            form.quantity.unwrap_or(1),
            form.size.as_deref(),
            form.color.as_deref(),
        )
        .await
    {
        Ok(()) => {}
        Err(CartServiceError::Cart(e)) => {
            let message = capitalize_first(&e.to_string());
            if is_htmx(&headers) {
                // htmx only swaps 2xx responses
                return Ok(Html(format!(
                    "<span class=\"form-error\">{}</span>",
                    escape_html(&message)
                ))
                .into_response());
            }
            return Ok(redirect_with_error(&back, &message).into_response());
        }
        Err(e) => return Err(e.into()),
    }

    if is_htmx(&headers) {
        return Ok((
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartAddedTemplate { name: product.name },
        )
            .into_response());
    }

    Ok(redirect_with_success(&back, &format!("{} added to your cart", product.name)).into_response())
}

/// Update cart item quantity.
#[instrument(skip(state, session, user, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let cart = CartService::new(state.pool(), &session, CartOwner::of(user.as_ref()));
    match cart.update(&form.key, form.quantity).await {
        Ok(()) | Err(CartServiceError::LineNotFound) => {}
        Err(e) => return Err(e.into()),
    }
    respond_with_items(&state, &cart, &headers).await
}

/// Remove item from cart.
#[instrument(skip(state, session, user, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let cart = CartService::new(state.pool(), &session, CartOwner::of(user.as_ref()));
    match cart.remove(&form.key).await {
        Ok(()) | Err(CartServiceError::LineNotFound) => {}
        Err(e) => return Err(e.into()),
    }
    respond_with_items(&state, &cart, &headers).await
}

/// Empty the cart.
#[instrument(skip(state, session, user, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
) -> Result<Response> {
    let cart = CartService::new(state.pool(), &session, CartOwner::of(user.as_ref()));
    cart.clear().await?;
    respond_with_items(&state, &cart, &headers).await
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session, user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let count = CartService::new(state.pool(), &session, CartOwner::of(user.as_ref()))
        .count()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to count cart");
            0
        });

    CartCountTemplate { count }
}

/// After a change: the refreshed items fragment for HTMX, otherwise back to
/// the cart page.
async fn respond_with_items(
    state: &AppState,
    cart: &CartService<'_>,
    headers: &HeaderMap,
) -> Result<Response> {
    if !is_htmx(headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    let lines = cart.lines().await?;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            summary: SummaryView::new(&lines, &state.config().store.pricing),
            has_unavailable: lines.iter().any(|l| !l.is_available()),
            lines: lines.iter().map(CartLineView::from).collect(),
        },
    )
        .into_response())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use elegance_core::Money;
    use elegance_core::catalog::Product;

    use super::*;

    fn line(price: i64, sale: Option<i64>, quantity: u32) -> CartLine {
        CartLine {
            key: "7".to_owned(),
            product: Product {
                id: ProductId::new(1),
                category_id: None,
                name: "Pearl Trim Abaya".to_owned(),
                slug: "pearl-trim-abaya".to_owned(),
                description: None,
                sku: None,
                price: Money::from_cents(price),
                sale_price: sale.map(Money::from_cents),
                stock_quantity: 3,
                images: vec!["/static/img/pearl.jpg".to_owned()],
                sizes: vec![],
                colors: vec![],
                is_active: true,
                is_featured: false,
                created_at: Utc::now(),
            },
            quantity,
            size: Some("M".to_owned()),
            color: None,
        }
    }

    #[test]
    fn test_line_view_shows_sale_price() {
        let view = CartLineView::from(&line(12_000, Some(9_000), 2));
        assert_eq!(view.unit_price, "$90.00");
        assert_eq!(view.regular_price.as_deref(), Some("$120.00"));
        assert_eq!(view.line_total, "$180.00");
        assert!(view.available);
    }

    #[test]
    fn test_line_view_flags_short_stock() {
        let view = CartLineView::from(&line(5_000, None, 5));
        assert!(!view.available);
        assert_eq!(view.regular_price, None);
    }

    #[test]
    fn test_summary_free_shipping() {
        let pricing = PricingConfig::default();
        let summary = SummaryView::new(&[line(10_000, None, 2)], &pricing);
        assert_eq!(summary.shipping, "Free");
        assert_eq!(summary.until_free_shipping, None);

        let summary = SummaryView::new(&[line(5_000, None, 1)], &pricing);
        assert_eq!(summary.shipping, "$15.00");
        assert_eq!(summary.until_free_shipping.as_deref(), Some("$150.00"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & y</b>"), "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;");
    }
}
