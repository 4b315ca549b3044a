//! Inventory route handlers: stock levels and stock updates.

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

use elegance_core::ProductId;
use elegance_core::catalog::{LOW_STOCK_THRESHOLD, Page, StockLevel};

use crate::components::pagination::page_href;
use crate::components::{FilterOption, Pagination};
use crate::db::{InventoryCounts, ProductAdminFilter, ProductRepository, ProductRow, RepositoryError};
use crate::error::Result;
use crate::filters;
use crate::forms::non_empty;
use crate::middleware::RequireAdminAuth;
use crate::routes::PER_PAGE;
use crate::state::AppState;
use crate::views::{Layout, redirect_with_error, redirect_with_success};

/// Largest stock quantity accepted from the form.
const MAX_STOCK: i32 = 100_000;

/// One row of the inventory table.
#[derive(Debug, Clone)]
pub struct InventoryRowView {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub stock_quantity: i32,
    pub level: StockLevel,
    pub is_active: bool,
}

impl From<&ProductRow> for InventoryRowView {
    fn from(row: &ProductRow) -> Self {
        Self {
            id: row.product.id.as_i32(),
            name: row.product.name.clone(),
            sku: row.product.sku.clone().unwrap_or_default(),
            category: row.category_name.clone().unwrap_or_default(),
            stock_quantity: row.product.stock_quantity,
            level: row.product.stock_level(),
            is_active: row.product.is_active,
        }
    }
}

/// Inventory list filters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InventoryQuery {
    pub search: String,
    pub stock: String,
    pub page: Option<u32>,
}

/// Stock update form data.
#[derive(Debug, Deserialize)]
pub struct StockForm {
    pub stock_quantity: String,
    /// List page to return to, with its filters.
    #[serde(default)]
    pub return_to: String,
}

/// Inventory template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/index.html")]
pub struct InventoryTemplate {
    pub layout: Layout,
    pub counts: InventoryCounts,
    pub rows: Vec<InventoryRowView>,
    pub search: String,
    pub levels: Vec<FilterOption>,
    pub threshold: i32,
    pub return_to: String,
    pub pagination: Pagination,
}

/// Build the inventory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(index))
        .route("/inventory/{id}", post(update_stock))
}

/// Stock levels, emptiest first, with counts per level.
///
/// GET /inventory
#[instrument(skip(state, layout, admin, query), fields(admin_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Query(query): Query<InventoryQuery>,
) -> Result<InventoryTemplate> {
    let page = Page::new(query.page, PER_PAGE);
    let filter = ProductAdminFilter {
        search: non_empty(&query.search),
        stock: StockLevel::parse(&query.stock),
        ..ProductAdminFilter::default()
    };

    let products = ProductRepository::new(state.pool());
    let (counts, (rows, total)) =
        tokio::try_join!(products.inventory_counts(), products.inventory(&filter, page))?;

    let params = [("search", query.search.as_str()), ("stock", query.stock.as_str())];
    let info = page.info(total);
    let pagination = Pagination::new(info, "/inventory", &params);
    let return_to = page_href("/inventory", &params, info.page);

    Ok(InventoryTemplate {
        layout,
        counts,
        rows: rows.iter().map(InventoryRowView::from).collect(),
        levels: FilterOption::list(StockLevel::ALL, &query.stock, |l| (l.as_str(), l.label())),
        search: query.search,
        threshold: LOW_STOCK_THRESHOLD,
        return_to,
        pagination,
    })
}

/// Set a product's stock on hand.
///
/// POST /inventory/{id}
#[instrument(skip(state, admin, form), fields(admin_id = %admin.id))]
async fn update_stock(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<StockForm>,
) -> Result<Redirect> {
    let back = safe_return(&form.return_to);
    let Some(quantity) = parse_stock(&form.stock_quantity) else {
        return Ok(redirect_with_error(
            back,
            &format!("Stock must be a whole number between 0 and {MAX_STOCK}"),
        ));
    };

    match ProductRepository::new(state.pool()).set_stock(id, quantity).await {
        Ok(()) => {
            tracing::info!(product_id = %id, quantity, "Stock updated");
            Ok(redirect_with_success(back, "Stock updated"))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_with_error(back, "Product not found")),
        Err(e) => Err(e.into()),
    }
}

fn parse_stock(value: &str) -> Option<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|q| (0..=MAX_STOCK).contains(q))
}

/// Only return to the inventory list itself.
fn safe_return(return_to: &str) -> &str {
    if return_to == "/inventory" || return_to.starts_with("/inventory?") {
        return_to
    } else {
        "/inventory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stock() {
        assert_eq!(parse_stock(" 12 "), Some(12));
        assert_eq!(parse_stock("0"), Some(0));
        assert_eq!(parse_stock("-3"), None);
        assert_eq!(parse_stock("2.5"), None);
        assert_eq!(parse_stock("1000001"), None);
    }

    #[test]
    fn test_safe_return() {
        assert_eq!(safe_return("/inventory?stock=out_of_stock"), "/inventory?stock=out_of_stock");
        assert_eq!(safe_return("https://evil.test/"), "/inventory");
        assert_eq!(safe_return("//evil.test"), "/inventory");
        assert_eq!(safe_return(""), "/inventory");
    }
}
