//! Product route handlers: list, create, edit, delete, and activation.
//!
//! The create and update handlers read the raw form body so that the
//! repeated `sizes` and `colors` checkboxes survive (see [`FormPairs`]).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use elegance_core::catalog::{COLORS, Category, Page, Product, SIZES, StockLevel};
use elegance_core::checkout::FieldError;
use elegance_core::{CategoryId, ProductId};

use crate::components::{FilterOption, Pagination};
use crate::db::{
    CategoryRepository, ProductAdminFilter, ProductFields, ProductRepository, ProductRow,
    ProductStatus, RepositoryError,
};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{FormPairs, error_for, is_valid_slug, lines, non_empty, parse_money, slugify};
use crate::middleware::RequireAdminAuth;
use crate::routes::PER_PAGE;
use crate::state::AppState;
use crate::views::{Layout, redirect_with_error, redirect_with_success};

const MAX_NAME_LENGTH: usize = 200;

// =============================================================================
// View types
// =============================================================================

/// One row of the products table.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub image: Option<String>,
    pub category: String,
    pub price: String,
    pub sale_price: Option<String>,
    pub stock_quantity: i32,
    pub stock: StockLevel,
    pub is_active: bool,
    pub is_featured: bool,
    pub storefront_url: Option<String>,
}

impl ProductRowView {
    fn new(row: &ProductRow, storefront_url: Option<String>) -> Self {
        let product = &row.product;
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            sku: product.sku.clone().unwrap_or_default(),
            image: product.primary_image().map(ToOwned::to_owned),
            category: row
                .category_name
                .clone()
                .unwrap_or_else(|| "Uncategorised".to_owned()),
            price: product.price.to_string(),
            sale_price: product.sale_price.map(|p| p.to_string()),
            stock_quantity: product.stock_quantity,
            stock: product.stock_level(),
            is_active: product.is_active,
            is_featured: product.is_featured,
            storefront_url,
        }
    }
}

/// A checkbox in the sizes or colors group.
#[derive(Debug, Clone)]
pub struct Choice {
    pub value: &'static str,
    pub checked: bool,
}

fn choices(all: &[&'static str], selected: &[String]) -> Vec<Choice> {
    all.iter()
        .map(|&value| Choice {
            value,
            checked: selected.iter().any(|s| s == value),
        })
        .collect()
}

// =============================================================================
// Query and form types
// =============================================================================

/// Product list filters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductsQuery {
    pub search: String,
    pub category: String,
    pub status: String,
    pub page: Option<u32>,
}

impl ProductsQuery {
    /// Parse into a repository filter. Unparseable values are ignored.
    #[must_use]
    pub fn filter(&self) -> ProductAdminFilter {
        ProductAdminFilter {
            search: non_empty(&self.search),
            category: self.category.trim().parse().ok(),
            status: ProductStatus::parse(&self.status),
            stock: None,
        }
    }
}

/// Raw product form values, kept as text for re-rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFormValues {
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub category_id: String,
    pub description: String,
    pub price: String,
    pub sale_price: String,
    pub stock_quantity: String,
    pub images: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
}

impl ProductFormValues {
    /// Defaults for a new product.
    fn blank() -> Self {
        Self {
            stock_quantity: "0".to_owned(),
            is_active: true,
            ..Self::default()
        }
    }

    /// Prefilled from an existing product.
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            sku: product.sku.clone().unwrap_or_default(),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_plain_string(),
            sale_price: product
                .sale_price
                .map(|p| p.to_plain_string())
                .unwrap_or_default(),
            stock_quantity: product.stock_quantity.to_string(),
            images: product.images.join("\n"),
            sizes: product.sizes.clone(),
            colors: product.colors.clone(),
            is_active: product.is_active,
            is_featured: product.is_featured,
        }
    }

    /// Read a submitted form body.
    fn from_pairs(form: &FormPairs) -> Self {
        Self {
            name: form.get("name").to_owned(),
            slug: form.get("slug").to_owned(),
            sku: form.get("sku").to_owned(),
            category_id: form.get("category_id").to_owned(),
            description: form.get("description").to_owned(),
            price: form.get("price").to_owned(),
            sale_price: form.get("sale_price").to_owned(),
            stock_quantity: form.get("stock_quantity").to_owned(),
            images: form.get("images").to_owned(),
            sizes: form.all("sizes"),
            colors: form.all("colors"),
            is_active: form.checked("is_active"),
            is_featured: form.checked("is_featured"),
        }
    }

    /// Validate every field, collecting all errors.
    ///
    /// A blank slug is derived from the name. Sizes and colors outside the
    /// store's lists are dropped.
    fn validate(&self, categories: &[Category]) -> std::result::Result<ProductFields, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(FieldError::new("name", "Name is too long"));
        }

        let slug = match non_empty(&self.slug) {
            Some(slug) => slug.to_lowercase(),
            None => slugify(name),
        };
        if !is_valid_slug(&slug) {
            errors.push(FieldError::new(
                "slug",
                "Use lowercase letters, numbers, and single dashes",
            ));
        }

        let category_id = match non_empty(&self.category_id) {
            None => None,
            Some(raw) => match raw.parse::<CategoryId>() {
                Ok(id) if categories.iter().any(|c| c.id == id) => Some(id),
                _ => {
                    errors.push(FieldError::new("category_id", "Choose a category from the list"));
                    None
                }
            },
        };

        let price = match parse_money(&self.price) {
            Some(price) if !price.is_zero() => Some(price),
            _ => {
                errors.push(FieldError::new("price", "Enter a price above zero"));
                None
            }
        };

        let sale_price = match non_empty(&self.sale_price) {
            None => None,
            Some(raw) => match (parse_money(&raw), price) {
                (Some(sale), Some(price)) if sale < price => Some(sale),
                (Some(_), Some(_)) => {
                    errors.push(FieldError::new("sale_price", "Sale price must be below the price"));
                    None
                }
                (Some(sale), None) => Some(sale),
                (None, _) => {
                    errors.push(FieldError::new("sale_price", "Enter a valid amount"));
                    None
                }
            },
        };

        let stock_quantity = match self.stock_quantity.trim().parse::<i32>() {
            Ok(quantity) if quantity >= 0 => quantity,
            _ => {
                errors.push(FieldError::new("stock_quantity", "Enter a whole number, 0 or more"));
                0
            }
        };

        let images = lines(&self.images);
        if images
            .iter()
            .any(|url| !(url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/')))
        {
            errors.push(FieldError::new("images", "Each image must be a URL or a /static path"));
        }

        match price {
            Some(price) if errors.is_empty() => Ok(ProductFields {
                category_id,
                name: name.to_owned(),
                slug,
                description: non_empty(&self.description),
                sku: non_empty(&self.sku),
                price,
                sale_price,
                stock_quantity,
                images,
                sizes: known(SIZES, &self.sizes),
                colors: known(COLORS, &self.colors),
                is_active: self.is_active,
                is_featured: self.is_featured,
            }),
            _ => Err(errors),
        }
    }
}

/// Selected values that appear in `allowed`, in `allowed` order.
fn known(allowed: &[&str], selected: &[String]) -> Vec<String> {
    allowed
        .iter()
        .filter(|a| selected.iter().any(|s| s.as_str() == **a))
        .map(|a| (*a).to_owned())
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRowView>,
    pub search: String,
    pub categories: Vec<FilterOption>,
    pub statuses: Vec<FilterOption>,
    pub pagination: Pagination,
}

/// New/edit product template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub product_id: Option<i32>,
    pub values: ProductFormValues,
    pub categories: Vec<FilterOption>,
    pub sizes: Vec<Choice>,
    pub colors: Vec<Choice>,
    pub errors: Vec<FieldError>,
    /// Form-level error, such as a duplicate slug.
    pub form_error: Option<String>,
}

impl ProductFormTemplate {
    fn new(
        layout: Layout,
        product_id: Option<ProductId>,
        values: ProductFormValues,
        categories: &[Category],
    ) -> Self {
        Self {
            layout,
            product_id: product_id.map(|id| id.as_i32()),
            categories: categories
                .iter()
                .map(|c| FilterOption::new(&c.id.to_string(), &c.name, &values.category_id))
                .collect(),
            sizes: choices(SIZES, &values.sizes),
            colors: choices(COLORS, &values.colors),
            values,
            errors: Vec::new(),
            form_error: None,
        }
    }

    /// First error message for a field.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        error_for(&self.errors, field)
    }

    /// Form action URL.
    #[must_use]
    pub fn action(&self) -> String {
        self.product_id
            .map_or_else(|| "/products".to_owned(), |id| format!("/products/{id}"))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/new", get(new_product))
        .route("/products/{id}", post(update))
        .route("/products/{id}/edit", get(edit))
        .route("/products/{id}/toggle", post(toggle_active))
        .route("/products/{id}/delete", post(delete))
}

/// List products with search, category, and status filters.
///
/// GET /products
#[instrument(skip(state, layout, admin, query), fields(admin_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Query(query): Query<ProductsQuery>,
) -> Result<ProductsIndexTemplate> {
    let page = Page::new(query.page, PER_PAGE);
    let products = ProductRepository::new(state.pool());
    let categories = CategoryRepository::new(state.pool());

    let filter = query.filter();
    let ((rows, total), categories) =
        tokio::try_join!(products.list(&filter, page), categories.list())?;

    let config = state.config();
    let pagination = Pagination::new(
        page.info(total),
        "/products",
        &[
            ("search", &query.search),
            ("category", &query.category),
            ("status", &query.status),
        ],
    );

    Ok(ProductsIndexTemplate {
        layout,
        products: rows
            .iter()
            .map(|row| ProductRowView::new(row, config.storefront_product_url(&row.product.slug)))
            .collect(),
        categories: categories
            .iter()
            .map(|c| FilterOption::new(&c.id.to_string(), &c.name, query.category.trim()))
            .collect(),
        statuses: FilterOption::list(ProductStatus::ALL, &query.status, |s| (s.as_str(), s.label())),
        search: query.search,
        pagination,
    })
}

/// Empty product form.
///
/// GET /products/new
#[instrument(skip(state, layout, admin), fields(admin_id = %admin.id))]
async fn new_product(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
) -> Result<ProductFormTemplate> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(ProductFormTemplate::new(
        layout,
        None,
        ProductFormValues::blank(),
        &categories,
    ))
}

/// Create a product.
///
/// POST /products
#[instrument(skip(state, layout, admin, body), fields(admin_id = %admin.id))]
async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    body: Bytes,
) -> Result<Response> {
    let values = ProductFormValues::from_pairs(&FormPairs::parse(&body));
    save(&state, layout, None, values).await
}

/// Edit form for an existing product.
///
/// GET /products/{id}/edit
#[instrument(skip(state, layout, admin), fields(admin_id = %admin.id))]
async fn edit(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate> {
    let products = ProductRepository::new(state.pool());
    let categories = CategoryRepository::new(state.pool());
    let (product, categories) = tokio::try_join!(products.get(id), categories.list())?;
    let product = product.ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;

    Ok(ProductFormTemplate::new(
        layout,
        Some(id),
        ProductFormValues::from_product(&product),
        &categories,
    ))
}

/// Update a product.
///
/// POST /products/{id}
#[instrument(skip(state, layout, admin, body), fields(admin_id = %admin.id))]
async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Path(id): Path<ProductId>,
    body: Bytes,
) -> Result<Response> {
    let values = ProductFormValues::from_pairs(&FormPairs::parse(&body));
    save(&state, layout, Some(id), values).await
}

/// Validate and store a product form, re-rendering it on any error.
async fn save(
    state: &AppState,
    layout: Layout,
    id: Option<ProductId>,
    values: ProductFormValues,
) -> Result<Response> {
    let categories = CategoryRepository::new(state.pool()).list().await?;

    let fields = match values.validate(&categories) {
        Ok(fields) => fields,
        Err(errors) => {
            let mut template = ProductFormTemplate::new(layout, id, values, &categories);
            template.errors = errors;
            return Ok(template.into_response());
        }
    };

    let repo = ProductRepository::new(state.pool());
    let result = match id {
        Some(id) => repo.update(id, &fields).await.map(|()| id),
        None => repo.create(&fields).await,
    };

    match result {
        Ok(saved) => {
            tracing::info!(product_id = %saved, slug = %fields.slug, "Product saved");
            let message = if id.is_some() { "Product updated" } else { "Product created" };
            Ok(redirect_with_success("/products", message).into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            let mut template = ProductFormTemplate::new(layout, id, values, &categories);
            template.form_error = Some(message);
            Ok(template.into_response())
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound("Product".to_owned())),
        Err(e) => Err(e.into()),
    }
}

/// Show or hide a product in the storefront.
///
/// POST /products/{id}/toggle
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn toggle_active(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    match ProductRepository::new(state.pool()).toggle_active(id).await {
        Ok(active) => {
            tracing::info!(product_id = %id, active, "Product visibility changed");
            let message = if active { "Product activated" } else { "Product deactivated" };
            Ok(redirect_with_success("/products", message))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_with_error("/products", "Product not found")),
        Err(e) => Err(e.into()),
    }
}

/// Delete a product.
///
/// POST /products/{id}/delete
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    match ProductRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            Ok(redirect_with_success("/products", "Product deleted"))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_with_error("/products", "Product not found")),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use elegance_core::Money;

    use super::*;

    fn categories() -> Vec<Category> {
        vec![Category {
            id: CategoryId::new(3),
            name: "Everyday Abayas".to_owned(),
            slug: "everyday-abayas".to_owned(),
            description: None,
            image_url: None,
        }]
    }

    fn valid() -> ProductFormValues {
        ProductFormValues {
            name: "Classic Black Abaya".to_owned(),
            category_id: "3".to_owned(),
            price: "89.99".to_owned(),
            stock_quantity: "25".to_owned(),
            sizes: vec!["M".to_owned(), "S".to_owned(), "Huge".to_owned()],
            colors: vec!["Black".to_owned()],
            images: "https://cdn.elegance.test/abaya-1.jpg\n".to_owned(),
            is_active: true,
            ..ProductFormValues::default()
        }
    }

    #[test]
    fn test_valid_form_derives_slug() {
        let fields = valid().validate(&categories()).unwrap();
        assert_eq!(fields.slug, "classic-black-abaya");
        assert_eq!(fields.category_id, Some(CategoryId::new(3)));
        assert_eq!(fields.price, Money::from_cents(8999));
        assert_eq!(fields.sizes, vec!["S", "M"]);
        assert_eq!(fields.images.len(), 1);
        assert_eq!(fields.sku, None);
    }

    #[test]
    fn test_collects_all_errors() {
        let values = ProductFormValues {
            name: String::new(),
            slug: "Bad Slug".to_owned(),
            category_id: "99".to_owned(),
            price: "0".to_owned(),
            stock_quantity: "-1".to_owned(),
            images: "ftp://x".to_owned(),
            ..ProductFormValues::default()
        };
        let errors = values.validate(&categories()).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["name", "slug", "category_id", "price", "stock_quantity", "images"]
        );
    }

    #[test]
    fn test_sale_price_must_be_below_price() {
        let mut values = valid();
        values.sale_price = "89.99".to_owned();
        let errors = values.validate(&categories()).unwrap_err();
        assert_eq!(error_for(&errors, "sale_price"), Some("Sale price must be below the price"));

        values.sale_price = "69.99".to_owned();
        let fields = values.validate(&categories()).unwrap();
        assert_eq!(fields.sale_price, Some(Money::from_cents(6999)));
    }

    #[test]
    fn test_form_values_round_trip_through_pairs() {
        let body = b"name=Abaya&price=10&sizes=S&sizes=L&colors=Gray&is_featured=on";
        let values = ProductFormValues::from_pairs(&FormPairs::parse(body));
        assert_eq!(values.sizes, vec!["S", "L"]);
        assert!(values.is_featured);
        assert!(!values.is_active);
    }

    #[test]
    fn test_choices_mark_selected() {
        let checked: Vec<_> = choices(SIZES, &["M".to_owned()])
            .into_iter()
            .filter(|c| c.checked)
            .map(|c| c.value)
            .collect();
        assert_eq!(checked, vec!["M"]);
    }

    #[test]
    fn test_query_filter() {
        let query = ProductsQuery {
            search: "abaya".to_owned(),
            category: "3".to_owned(),
            status: "out_of_stock".to_owned(),
            page: Some(2),
        };
        let filter = query.filter();
        assert_eq!(filter.category, Some(CategoryId::new(3)));
        assert_eq!(filter.status, Some(ProductStatus::OutOfStock));
    }
}
