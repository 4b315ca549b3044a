//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use elegance_core::catalog::{LOW_STOCK_THRESHOLD, Product, StockLevel};

use crate::db::{AnalyticsRepository, DashboardTotals, OrderRepository, ProductRepository, ReviewRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::orders::OrderRowView;
use crate::state::AppState;
use crate::views::Layout;

/// Rows in each dashboard list.
const DASHBOARD_LIST_SIZE: i64 = 5;

/// Dashboard metrics.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub revenue: String,
    pub orders: i64,
    pub pending_orders: i64,
    pub customers: i64,
    pub products: i64,
    pub pending_reviews: i64,
}

impl DashboardMetrics {
    fn new(totals: DashboardTotals, pending_reviews: i64) -> Self {
        Self {
            revenue: totals.revenue.to_string(),
            orders: totals.orders,
            pending_orders: totals.pending_orders,
            customers: totals.customers,
            products: totals.products,
            pending_reviews,
        }
    }
}

/// A product running out of stock.
#[derive(Debug, Clone)]
pub struct LowStockView {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub stock_quantity: i32,
    pub level: StockLevel,
}

impl From<&Product> for LowStockView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            sku: product.sku.clone().unwrap_or_default(),
            stock_quantity: product.stock_quantity,
            level: product.stock_level(),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub metrics: DashboardMetrics,
    pub orders: Vec<OrderRowView>,
    pub low_stock: Vec<LowStockView>,
    pub low_stock_threshold: i32,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Store totals, the latest orders, and products about to sell out.
///
/// GET /
#[instrument(skip(state, layout, admin), fields(admin_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
) -> Result<DashboardTemplate> {
    let analytics = AnalyticsRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let products = ProductRepository::new(state.pool());
    let reviews = ReviewRepository::new(state.pool());

    let (totals, recent, low_stock, pending_reviews) = tokio::try_join!(
        analytics.totals(),
        orders.recent(DASHBOARD_LIST_SIZE),
        products.low_stock(DASHBOARD_LIST_SIZE),
        reviews.pending_count(),
    )?;

    Ok(DashboardTemplate {
        layout,
        metrics: DashboardMetrics::new(totals, pending_reviews),
        orders: recent.iter().map(OrderRowView::from).collect(),
        low_stock: low_stock.iter().map(LowStockView::from).collect(),
        low_stock_threshold: LOW_STOCK_THRESHOLD,
    })
}
