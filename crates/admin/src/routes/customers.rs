//! Customer route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use elegance_core::catalog::Page;
use elegance_core::{UserId, UserRole};

use crate::components::Pagination;
use crate::db::{CustomerFilter, CustomerRepository, OrderFilter, OrderRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::non_empty;
use crate::middleware::RequireAdminAuth;
use crate::models::CustomerRow;
use crate::routes::PER_PAGE;
use crate::routes::orders::OrderRowView;
use crate::state::AppState;
use crate::views::{Layout, short_date};

/// Customer display data.
#[derive(Debug, Clone)]
pub struct CustomerView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_admin: bool,
    pub order_count: i64,
    pub total_spent: String,
    pub last_order: String,
    pub joined: String,
}

impl From<&CustomerRow> for CustomerView {
    fn from(row: &CustomerRow) -> Self {
        Self {
            id: row.id.as_i32(),
            name: row.full_name(),
            email: row.email.clone(),
            phone: row.phone.clone().unwrap_or_default(),
            is_admin: row.role == UserRole::Admin,
            order_count: row.order_count,
            total_spent: row.total_spent.to_string(),
            last_order: row.last_order_at.map(short_date).unwrap_or_default(),
            joined: short_date(row.created_at),
        }
    }
}

/// Customer list query.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CustomersQuery {
    pub search: String,
    pub page: Option<u32>,
}

/// Order history page on the customer detail screen.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CustomerOrdersQuery {
    pub page: Option<u32>,
}

/// Customer list template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub layout: Layout,
    pub customers: Vec<CustomerView>,
    pub search: String,
    pub pagination: Pagination,
}

/// Customer detail template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub layout: Layout,
    pub customer: CustomerView,
    pub orders: Vec<OrderRowView>,
    pub pagination: Pagination,
}

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(index))
        .route("/customers/{id}", get(show))
}

/// List customers with their order count and spend.
///
/// GET /customers
#[instrument(skip(state, layout, admin, query), fields(admin_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Query(query): Query<CustomersQuery>,
) -> Result<CustomersIndexTemplate> {
    let page = Page::new(query.page, PER_PAGE);
    let filter = CustomerFilter {
        search: non_empty(&query.search),
    };
    let (customers, total) = CustomerRepository::new(state.pool())
        .list(&filter, page)
        .await?;

    Ok(CustomersIndexTemplate {
        layout,
        customers: customers.iter().map(CustomerView::from).collect(),
        pagination: Pagination::new(page.info(total), "/customers", &[("search", &query.search)]),
        search: query.search,
    })
}

/// One customer with their orders.
///
/// GET /customers/{id}
#[instrument(skip(state, layout, admin, query), fields(admin_id = %admin.id))]
async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Path(id): Path<UserId>,
    Query(query): Query<CustomerOrdersQuery>,
) -> Result<CustomerShowTemplate> {
    let page = Page::new(query.page, PER_PAGE);
    let filter = OrderFilter {
        customer: Some(id),
        ..OrderFilter::default()
    };

    let customers = CustomerRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let (customer, (orders, total)) = tokio::try_join!(customers.get(id), orders.list(&filter, page))?;
    let customer = customer.ok_or_else(|| AppError::NotFound(format!("Customer {id}")))?;

    Ok(CustomerShowTemplate {
        layout,
        customer: CustomerView::from(&customer),
        orders: orders.iter().map(OrderRowView::from).collect(),
        pagination: Pagination::new(page.info(total), &format!("/customers/{id}"), &[]),
    })
}
