//! Order route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use elegance_core::catalog::Page;
use elegance_core::checkout::Address;
use elegance_core::{OrderId, OrderStatus, PaymentStatus};

use crate::components::{FilterOption, Pagination};
use crate::db::{OrderFilter, OrderRepository, StatusChangeError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{non_empty, parse_date};
use crate::middleware::RequireAdminAuth;
use crate::models::{Order, OrderItem, OrderRow};
use crate::routes::PER_PAGE;
use crate::state::AppState;
use crate::views::{Layout, redirect_with_error, redirect_with_success, short_date};

// =============================================================================
// View types
// =============================================================================

/// One row of an order table.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: i32,
    pub number: String,
    pub customer: String,
    pub email: String,
    pub date: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub item_count: i64,
    pub total: String,
}

impl From<&OrderRow> for OrderRowView {
    fn from(order: &OrderRow) -> Self {
        Self {
            id: order.id.as_i32(),
            number: order.id.number(),
            customer: order.customer_name(),
            email: order.email.clone(),
            date: short_date(order.created_at),
            status: order.status,
            payment_status: order.payment_status,
            item_count: order.item_count,
            total: order.total.to_string(),
        }
    }
}

/// Order header, addresses, and totals.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub id: i32,
    pub number: String,
    pub placed_at: String,
    pub updated_at: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub customer: String,
    pub customer_id: Option<i32>,
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
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_i32(),
            number: order.id.number(),
            placed_at: order.created_at.format("%B %-d, %Y %H:%M UTC").to_string(),
            updated_at: order.updated_at.format("%B %-d, %Y %H:%M UTC").to_string(),
            status: order.status,
            payment_status: order.payment_status,
            customer: order.customer_name(),
            customer_id: order.user_id.map(|id| id.as_i32()),
            email: order.email.clone(),
            phone: order.phone.clone(),
            shipping_address: order.shipping_address.0.clone(),
            billing_address: order.billing_address.as_ref().map(|a| a.0.clone()),
            shipping_method: order.shipping_method.label(),
            payment_method: order.payment_method.as_str(),
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
        }
    }
}

/// One purchased line.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub name: String,
    pub image: Option<String>,
    pub variant: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        let variant = [item.size.as_deref(), item.color.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");
        Self {
            name: item.product_name.clone(),
            image: item.product_image.clone(),
            variant,
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            line_total: item.line_total().to_string(),
        }
    }
}

// =============================================================================
// Query and form types
// =============================================================================

/// Order list filters, as submitted by the filter form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrdersQuery {
    pub search: String,
    pub status: String,
    pub from: String,
    pub to: String,
    pub page: Option<u32>,
}

impl OrdersQuery {
    /// Parse into a repository filter. Unparseable values are ignored.
    #[must_use]
    pub fn filter(&self) -> OrderFilter {
        OrderFilter {
            search: non_empty(&self.search),
            status: self.status.parse().ok(),
            from: parse_date(&self.from),
            to: parse_date(&self.to),
            customer: None,
        }
    }
}

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRowView>,
    pub statuses: Vec<FilterOption>,
    pub search: String,
    pub from: String,
    pub to: String,
    pub pagination: Pagination,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderDetailView,
    pub items: Vec<OrderItemView>,
    pub next_statuses: Vec<OrderStatus>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", post(update_status))
}

/// List orders with search, status, and date filters.
///
/// GET /orders
#[instrument(skip(state, layout, admin, query), fields(admin_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersIndexTemplate> {
    let page = Page::new(query.page, PER_PAGE);
    let (orders, total) = OrderRepository::new(state.pool())
        .list(&query.filter(), page)
        .await?;

    let pagination = Pagination::new(
        page.info(total),
        "/orders",
        &[
            ("search", &query.search),
            ("status", &query.status),
            ("from", &query.from),
            ("to", &query.to),
        ],
    );

    Ok(OrdersIndexTemplate {
        layout,
        orders: orders.iter().map(OrderRowView::from).collect(),
        statuses: FilterOption::list(OrderStatus::ALL, &query.status, |s| (s.as_str(), s.label())),
        search: query.search,
        from: query.from,
        to: query.to,
        pagination,
    })
}

/// Show one order with its lines and the allowed next statuses.
///
/// GET /orders/{id}
#[instrument(skip(state, layout, admin), fields(admin_id = %admin.id))]
async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Path(id): Path<OrderId>,
) -> Result<OrderShowTemplate> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;
    let items = repo.items(order.id).await?;

    Ok(OrderShowTemplate {
        layout,
        order: OrderDetailView::from(&order),
        items: items.iter().map(OrderItemView::from).collect(),
        next_statuses: order.next_statuses(),
    })
}

/// Move an order to a new status.
///
/// POST /orders/{id}/status
#[instrument(skip(state, admin, form), fields(admin_id = %admin.id, status = %form.status))]
async fn update_status(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let path = format!("/orders/{id}");
    let Ok(next) = form.status.parse::<OrderStatus>() else {
        return Ok(redirect_with_error(&path, "Unknown order status"));
    };

    match OrderRepository::new(state.pool()).update_status(id, next).await {
        Ok(previous) => {
            tracing::info!(order_id = %id, from = %previous, to = %next, "Order status changed");
            Ok(redirect_with_success(
                &path,
                &format!("Order marked as {}", next.label().to_lowercase()),
            ))
        }
        Err(StatusChangeError::InvalidTransition { from, to }) => Ok(redirect_with_error(
            &path,
            &format!("A {} order can't be marked as {}", from.label().to_lowercase(), to.label().to_lowercase()),
        )),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filter_ignores_bad_values() {
        let query = OrdersQuery {
            search: "  ".to_owned(),
            status: "lost".to_owned(),
            from: "2025-01-01".to_owned(),
            to: "yesterday".to_owned(),
            page: None,
        };
        let filter = query.filter();
        assert_eq!(filter.search, None);
        assert_eq!(filter.status, None);
        assert!(filter.from.is_some());
        assert_eq!(filter.to, None);
    }

    #[test]
    fn test_query_filter_status() {
        let query = OrdersQuery {
            status: "shipped".to_owned(),
            search: "ORD-000042".to_owned(),
            ..OrdersQuery::default()
        };
        let filter = query.filter();
        assert_eq!(filter.status, Some(OrderStatus::Shipped));
        assert_eq!(filter.search.as_deref(), Some("ORD-000042"));
    }
}
