//! View data shared by page templates.
//!
//! Every full page extends `base.html`, which needs the header and footer
//! data in [`Layout`]. Handlers take `Layout` as an extractor and put it in
//! their template struct.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use tower_sessions::Session;

use elegance_core::catalog::{Product, StockLevel};
use elegance_core::checkout::Address;
use elegance_core::{OrderStatus, PaymentMethod, ProductId};

use crate::models::{CurrentUser, Order, OrderItem, keys};
use crate::services::{CartOwner, CartService};
use crate::state::AppState;

/// Category link in the navigation menu.
#[derive(Debug, Clone)]
pub struct NavCategory {
    pub name: String,
    pub slug: String,
}

/// Header, footer, and status-banner data for `base.html`.
#[derive(Debug, Clone)]
pub struct Layout {
    pub store_name: String,
    pub user_name: Option<String>,
    pub cart_count: u32,
    pub categories: Vec<NavCategory>,
    /// Banner text from an `?error=` redirect.
    pub error: Option<String>,
    /// Banner text from a `?success=` redirect.
    pub success: Option<String>,
    pub path: String,
}

impl Layout {
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user_name.is_some()
    }

    /// Whether a nav link should be highlighted.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.path == "/"
        } else {
            self.path.starts_with(prefix)
        }
    }
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().cloned();

        let user = match &session {
            Some(session) => session
                .get::<CurrentUser>(keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        let cart_count = match &session {
            Some(session) => CartService::new(state.pool(), session, CartOwner::of(user.as_ref()))
                .count()
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to count cart for header");
                    0
                }),
            None => 0,
        };

        let categories = match state.categories().await {
            Ok(categories) => categories
                .iter()
                .map(|c| NavCategory {
                    name: c.name.clone(),
                    slug: c.slug.clone(),
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load navigation categories");
                Vec::new()
            }
        };

        let (error, success) = status_messages(parts.uri.query());

        Ok(Self {
            store_name: state.config().store.name.clone(),
            user_name: user.map(|u| u.display_name().to_owned()),
            cart_count,
            categories,
            error,
            success,
            path: parts.uri.path().to_owned(),
        })
    }
}

/// Pull `error` and `success` out of a query string. Blank values are ignored.
fn status_messages(query: Option<&str>) -> (Option<String>, Option<String>) {
    let mut error = None;
    let mut success = None;
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "error" => error = Some(value.to_owned()),
            "success" => success = Some(value.to_owned()),
            _ => {}
        }
    }
    (error, success)
}

/// Redirect to `path` with an error banner.
#[must_use]
pub fn redirect_with_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_message(path, "error", message))
}

/// Redirect to `path` with a success banner.
#[must_use]
pub fn redirect_with_success(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_message(path, "success", message))
}

/// Uppercase the first letter of an error message for display.
#[must_use]
pub fn capitalize_first(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn with_message(path: &str, key: &str, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={}", urlencoding::encode(message))
}

/// Product tile used on the home page, catalog, related products, and
/// wishlist.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub image: Option<String>,
    pub price: String,
    /// Crossed-out regular price when on sale.
    pub regular_price: Option<String>,
    pub discount_percent: Option<u32>,
    pub stock: StockLevel,
    pub in_stock: bool,
    pub is_featured: bool,
    pub wishlisted: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, wishlisted: bool) -> Self {
        Self {
            id: product.id.as_i32(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            image: product.primary_image().map(ToOwned::to_owned),
            price: product.effective_price().to_string(),
            regular_price: product
                .is_on_sale()
                .then(|| product.price.to_string()),
            discount_percent: product.discount_percent(),
            stock: product.stock_level(),
            in_stock: product.in_stock(),
            is_featured: product.is_featured,
            wishlisted,
        }
    }

    /// Cards for a list of products, marking those in `wishlist`.
    #[must_use]
    pub fn list(products: &[Product], wishlist: &[ProductId]) -> Vec<Self> {
        products
            .iter()
            .map(|p| Self::new(p, wishlist.contains(&p.id)))
            .collect()
    }
}

/// Order header and totals for the confirmation and order detail pages.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: i32,
    pub number: String,
    pub date: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub shipping_method: &'static str,
    pub payment_method: &'static str,
    pub promo_code: Option<String>,
    pub subtotal: String,
    pub shipping: String,
    pub discount: Option<String>,
    pub tax: String,
    pub total: String,
    pub can_cancel: bool,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_i32(),
            number: order.number(),
            date: order.created_at.format("%B %-d, %Y").to_string(),
            status: order.status,
            customer_name: format!("{} {}", order.first_name, order.last_name),
            email: order.email.clone(),
            phone: order.phone.clone(),
            shipping_address: order.shipping_address.0.clone(),
            billing_address: order.billing_address.as_ref().map(|a| a.0.clone()),
            shipping_method: order.shipping_method.label(),
            payment_method: match order.payment_method {
                PaymentMethod::Card => "Credit card",
                PaymentMethod::Paypal => "PayPal",
            },
            promo_code: order.promo_code.clone(),
            subtotal: order.subtotal.to_string(),
            shipping: if order.shipping_cost.is_zero() {
                "Free".to_owned()
            } else {
                order.shipping_cost.to_string()
            },
            discount: (!order.discount_amount.is_zero()).then(|| order.discount_amount.to_string()),
            tax: order.tax_amount.to_string(),
            total: order.total.to_string(),
            can_cancel: order.status.can_cancel(),
        }
    }
}

/// One purchased line.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub product_id: Option<i32>,
    pub name: String,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.map(|id| id.as_i32()),
            name: item.product_name.clone(),
            image: item.product_image.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            line_total: item.line_total().to_string(),
        }
    }
}

/// CSS background for a color swatch.
#[must_use]
pub fn swatch(color: &str) -> &'static str {
    match color {
        "Black" => "#000000",
        "Navy Blue" => "#1e3a8a",
        "Gray" => "#6b7280",
        "Brown" => "#92400e",
        "Dark Green" => "#065f46",
        "Burgundy" => "#7c2d12",
        _ => "#d1d5db",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(
            status_messages(Some("error=Out%20of%20stock&page=2")),
            (Some("Out of stock".to_owned()), None)
        );
        assert_eq!(
            status_messages(Some("success=Saved&error=")),
            (None, Some("Saved".to_owned()))
        );
        assert_eq!(status_messages(None), (None, None));
    }

    #[test]
    fn test_with_message_appends_to_existing_query() {
        assert_eq!(
            with_message("/cart", "error", "Size required"),
            "/cart?error=Size%20required"
        );
        assert_eq!(
            with_message("/auth/login?next=%2Fcheckout", "success", "Welcome"),
            "/auth/login?next=%2Fcheckout&success=Welcome"
        );
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("please select a size"), "Please select a size");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_swatch_falls_back() {
        assert_eq!(swatch("Black"), "#000000");
        assert_eq!(swatch("Teal"), "#d1d5db");
    }
}
