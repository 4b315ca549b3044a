//! Catalog and product detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, RawQuery, State},
    response::Redirect,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use elegance_core::catalog::{
    COLORS, Category, Page, PageInfo, Product, ProductFilter, SIZES, SortOrder,
};
use elegance_core::reviews::{MAX_RATING, MIN_RATING, RatingSummary, ReviewSort};
use elegance_core::{Money, cart::MAX_LINE_QUANTITY};

use crate::db::{NewReview, ProductRepository, ReviewRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::Review;
use crate::state::AppState;
use crate::views::{Layout, ProductCard, redirect_with_error, redirect_with_success, swatch};

const RELATED_PRODUCTS: i64 = 4;
const MAX_REVIEW_TITLE: usize = 100;
const MAX_REVIEW_COMMENT: usize = 2000;

// =============================================================================
// Catalog query
// =============================================================================

/// Catalog query string.
///
/// Parsed by hand because `size`, `color`, and `availability` repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub availability: Vec<String>,
    pub sort: SortOrder,
    pub page: Option<u32>,
    pub list_view: bool,
}

impl CatalogQuery {
    /// Parse a raw query string. Blank values are ignored.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "category" => query.category = Some(value.to_owned()),
                "search" | "q" => query.search = Some(value.to_owned()),
                "min_price" => query.min_price = Some(value.to_owned()),
                "max_price" => query.max_price = Some(value.to_owned()),
                "size" => push_unique(&mut query.sizes, value),
                "color" => push_unique(&mut query.colors, value),
                "availability" => push_unique(&mut query.availability, value),
                "sort" => query.sort = SortOrder::parse(value),
                "page" => query.page = value.parse().ok(),
                "view" => query.list_view = value == "list",
                _ => {}
            }
        }
        query
    }

    /// Build the product filter. `category` is the resolved category, if the
    /// slug matched one.
    #[must_use]
    pub fn filter(&self, category: Option<&Category>) -> ProductFilter {
        ProductFilter {
            category: category.map(|c| c.id),
            search: self.search.clone(),
            min_price: parse_price(self.min_price.as_deref()),
            max_price: parse_price(self.max_price.as_deref()),
            sizes: self.sizes.clone(),
            colors: self.colors.clone(),
            in_stock: self.has_availability("in_stock"),
            on_sale: self.has_availability("on_sale"),
            featured: self.has_availability("featured"),
        }
    }

    fn has_availability(&self, value: &str) -> bool {
        self.availability.iter().any(|a| a == value)
    }

    /// Catalog URL for this query on another page.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        let mut query = self.clone();
        query.page = Some(page);
        query.to_url()
    }

    /// Catalog URL for this query in grid or list view.
    #[must_use]
    pub fn view_url(&self, list: bool) -> String {
        let mut query = self.clone();
        query.list_view = list;
        query.to_url()
    }

    fn to_url(&self) -> String {
        let mut s = url::form_urlencoded::Serializer::new(String::new());
        if let Some(category) = &self.category {
            s.append_pair("category", category);
        }
        if let Some(search) = &self.search {
            s.append_pair("search", search);
        }
        if let Some(min) = &self.min_price {
            s.append_pair("min_price", min);
        }
        if let Some(max) = &self.max_price {
            s.append_pair("max_price", max);
        }
        for size in &self.sizes {
            s.append_pair("size", size);
        }
        for color in &self.colors {
            s.append_pair("color", color);
        }
        for availability in &self.availability {
            s.append_pair("availability", availability);
        }
        if self.sort != SortOrder::default() {
            s.append_pair("sort", self.sort.as_str());
        }
        if self.list_view {
            s.append_pair("view", "list");
        }
        if let Some(page) = self.page.filter(|p| *p > 1) {
            s.append_pair("page", &page.to_string());
        }

        let query = s.finish();
        if query.is_empty() {
            "/products".to_owned()
        } else {
            format!("/products?{query}")
        }
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_owned());
    }
}

/// Non-negative decimal price; anything else means "no bound".
fn parse_price(value: Option<&str>) -> Option<Money> {
    value?
        .trim_start_matches('$')
        .parse::<Decimal>()
        .ok()
        .filter(|d| !d.is_sign_negative())
        .map(Money::new)
}

// =============================================================================
// View types
// =============================================================================

/// Checkbox, radio, or select option in the filter sidebar.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
    /// Swatch color for color filters.
    pub swatch: Option<&'static str>,
}

/// Numbered pagination link.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: u32,
    pub url: String,
    pub current: bool,
}

/// A review as displayed.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub reviewer_name: String,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub date: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            reviewer_name: review.reviewer_name.clone(),
            rating: review.rating,
            title: review.title.clone(),
            comment: review.comment.clone(),
            date: review.created_at.format("%B %-d, %Y").to_string(),
        }
    }
}

/// Color choice on the product page.
#[derive(Debug, Clone)]
pub struct ColorChoice {
    pub name: String,
    pub swatch: &'static str,
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct CatalogTemplate {
    pub layout: Layout,
    pub heading: String,
    pub products: Vec<ProductCard>,
    pub page: PageInfo,
    pub page_links: Vec<PageLink>,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub grid_url: String,
    pub list_url: String,
    pub list_view: bool,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub categories: Vec<FilterOption>,
    pub sizes: Vec<FilterOption>,
    pub colors: Vec<FilterOption>,
    pub sorts: Vec<FilterOption>,
    pub in_stock: bool,
    pub on_sale: bool,
    pub featured: bool,
    pub has_filters: bool,
}

impl CatalogTemplate {
    /// Whether the "All" category option is the active one.
    #[must_use]
    pub fn all_categories(&self) -> bool {
        !self.categories.iter().any(|c| c.selected)
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductTemplate {
    pub layout: Layout,
    pub product: Product,
    pub card: ProductCard,
    pub category: Option<Category>,
    pub colors: Vec<ColorChoice>,
    pub max_quantity: u32,
    pub rating: RatingSummary,
    pub reviews: Vec<ReviewView>,
    pub review_sorts: Vec<FilterOption>,
    pub related: Vec<ProductCard>,
    pub wishlisted: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the catalog with filters, sorting, and pagination.
#[instrument(skip(state, layout, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    layout: Layout,
    RawQuery(raw): RawQuery,
) -> Result<CatalogTemplate> {
    let query = CatalogQuery::parse(raw.as_deref());
    let categories = state.categories().await?;
    let category = query
        .category
        .as_deref()
        .and_then(|slug| categories.iter().find(|c| c.slug == slug));

    let filter = query.filter(category);
    let page = Page::new(query.page, Page::DEFAULT_PER_PAGE);

    let wishlist = WishlistRepository::new(state.pool());
    let product_repo = ProductRepository::new(state.pool());
    let ((products, total), wishlisted) = tokio::try_join!(
        product_repo.list(&filter, query.sort, page),
        async {
            match &user {
                Some(user) => wishlist.product_ids(user.id).await,
                None => Ok(Vec::new()),
            }
        },
    )?;
    let info = page.info(total);

    let heading = match (category, filter.search_term()) {
        (_, Some(term)) => format!("Search results for \u{201c}{term}\u{201d}"),
        (Some(category), None) => category.name.clone(),
        (None, None) => "All Abayas".to_owned(),
    };

    Ok(CatalogTemplate {
        layout,
        heading,
        products: ProductCard::list(&products, &wishlisted),
        page_links: info
            .window()
            .into_iter()
            .map(|number| PageLink {
                number,
                url: query.page_url(number),
                current: number == info.page,
            })
            .collect(),
        prev_url: info.has_prev().then(|| query.page_url(info.page - 1)),
        next_url: info.has_next().then(|| query.page_url(info.page + 1)),
        page: info,
        grid_url: query.view_url(false),
        list_url: query.view_url(true),
        list_view: query.list_view,
        search: query.search.clone().unwrap_or_default(),
        min_price: query.min_price.clone().unwrap_or_default(),
        max_price: query.max_price.clone().unwrap_or_default(),
        categories: categories
            .iter()
            .map(|c| FilterOption {
                value: c.slug.clone(),
                label: c.name.clone(),
                selected: category.is_some_and(|selected| selected.id == c.id),
                swatch: None,
            })
            .collect(),
        sizes: SIZES
            .iter()
            .map(|size| FilterOption {
                value: (*size).to_owned(),
                label: (*size).to_owned(),
                selected: query.sizes.iter().any(|s| s == size),
                swatch: None,
            })
            .collect(),
        colors: COLORS
            .iter()
            .map(|color| FilterOption {
                value: (*color).to_owned(),
                label: (*color).to_owned(),
                selected: query.colors.iter().any(|c| c == color),
                swatch: Some(swatch(color)),
            })
            .collect(),
        sorts: SortOrder::ALL
            .iter()
            .map(|sort| FilterOption {
                value: sort.as_str().to_owned(),
                label: sort.label().to_owned(),
                selected: *sort == query.sort,
                swatch: None,
            })
            .collect(),
        in_stock: filter.in_stock,
        on_sale: filter.on_sale,
        featured: filter.featured,
        has_filters: filter.is_active(),
    })
}

/// Query parameters on the product page.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    pub review_sort: Option<String>,
}

/// Display a product with its reviews and related products.
#[instrument(skip(state, layout, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    layout: Layout,
    Path(slug): Path<String>,
    Query(query): Query<ReviewQuery>,
) -> Result<ProductTemplate> {
    let review_sort = query
        .review_sort
        .as_deref()
        .map(ReviewSort::parse)
        .unwrap_or_default();
    let products = ProductRepository::new(state.pool());
    let product = products
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {slug}")))?;

    let wishlist = WishlistRepository::new(state.pool());
    let review_repo = ReviewRepository::new(state.pool());
    let (reviews, related, wishlisted, wishlist_ids, categories) = tokio::try_join!(
        review_repo.approved_for_product(product.id, review_sort),
        products.related(&product, RELATED_PRODUCTS),
        async {
            match &user {
                Some(user) => wishlist.contains(user.id, product.id).await,
                None => Ok(false),
            }
        },
        async {
            match &user {
                Some(user) => wishlist.product_ids(user.id).await,
                None => Ok(Vec::new()),
            }
        },
        state.categories(),
    )?;

    let ratings: Vec<i16> = reviews.iter().map(|r| r.rating).collect();
    let max_quantity = u32::try_from(product.stock_quantity)
        .unwrap_or(0)
        .min(MAX_LINE_QUANTITY);

    Ok(ProductTemplate {
        layout,
        card: ProductCard::new(&product, wishlisted),
        category: product
            .category_id
            .and_then(|id| categories.iter().find(|c| c.id == id).cloned()),
        colors: product
            .colors
            .iter()
            .map(|name| ColorChoice {
                name: name.clone(),
                swatch: swatch(name),
            })
            .collect(),
        max_quantity,
        rating: RatingSummary::from_ratings(&ratings),
        reviews: reviews.iter().map(ReviewView::from).collect(),
        review_sorts: ReviewSort::ALL
            .iter()
            .map(|sort| FilterOption {
                value: sort.as_str().to_owned(),
                label: sort.label().to_owned(),
                selected: *sort == review_sort,
                swatch: None,
            })
            .collect(),
        related: ProductCard::list(&related, &wishlist_ids),
        wishlisted,
        product,
    })
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: i16,
    pub title: String,
    pub comment: String,
}

impl ReviewForm {
    fn validate(&self) -> std::result::Result<(), &'static str> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err("Please choose a rating from 1 to 5 stars");
        }
        if self.title.trim().is_empty() {
            return Err("Please give your review a title");
        }
        if self.title.trim().chars().count() > MAX_REVIEW_TITLE {
            return Err("Review title is too long");
        }
        if self.comment.trim().is_empty() {
            return Err("Please write a few words about the product");
        }
        if self.comment.trim().chars().count() > MAX_REVIEW_COMMENT {
            return Err("Review is too long");
        }
        Ok(())
    }
}

/// Submit a review. It appears once approved.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn submit_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {slug}")))?;
    let back = format!("/products/{}", product.slug);

    if let Err(message) = form.validate() {
        return Ok(redirect_with_error(&back, message));
    }

    ReviewRepository::new(state.pool())
        .create(&NewReview {
            product_id: product.id,
            user_id: Some(user.id),
            reviewer_name: user.display_name().to_owned(),
            reviewer_email: user.email.to_string(),
            rating: form.rating,
            title: form.title.trim().to_owned(),
            comment: form.comment.trim().to_owned(),
        })
        .await?;

    tracing::info!(product_id = %product.id, rating = form.rating, "Review submitted");
    Ok(redirect_with_success(
        &back,
        "Thank you! Your review will appear once it has been approved.",
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use elegance_core::CategoryId;

    use super::*;

    #[test]
    fn test_parse_repeated_params() {
        let query = CatalogQuery::parse(Some(
            "category=modern&size=S&size=M&size=S&color=Black&availability=on_sale&sort=price_desc&page=3&view=list",
        ));
        assert_eq!(query.category.as_deref(), Some("modern"));
        assert_eq!(query.sizes, vec!["S", "M"]);
        assert_eq!(query.colors, vec!["Black"]);
        assert_eq!(query.sort, SortOrder::PriceDesc);
        assert_eq!(query.page, Some(3));
        assert!(query.list_view);
    }

    #[test]
    fn test_parse_ignores_blank_and_bad_values() {
        let query = CatalogQuery::parse(Some("search=&page=abc&sort=bogus&min_price="));
        assert_eq!(query, CatalogQuery::default());
    }

    #[test]
    fn test_filter_prices() {
        let query = CatalogQuery::parse(Some("min_price=50&max_price=-3&availability=in_stock"));
        let filter = query.filter(None);
        assert_eq!(filter.min_price, Some(Money::from_cents(5000)));
        assert_eq!(filter.max_price, None);
        assert!(filter.in_stock);
        assert!(!filter.on_sale);
    }

    #[test]
    fn test_filter_uses_resolved_category() {
        let category = Category {
            id: CategoryId::new(4),
            name: "Modern Abayas".to_owned(),
            slug: "modern".to_owned(),
            description: None,
            image_url: None,
        };
        let filter = CatalogQuery::parse(Some("category=modern")).filter(Some(&category));
        assert_eq!(filter.category, Some(CategoryId::new(4)));
    }

    #[test]
    fn test_page_url_keeps_filters() {
        let query = CatalogQuery::parse(Some("color=Navy+Blue&sort=newest&page=2"));
        assert_eq!(query.page_url(1), "/products?color=Navy+Blue&sort=newest");
        assert_eq!(
            query.page_url(3),
            "/products?color=Navy+Blue&sort=newest&page=3"
        );
        assert_eq!(CatalogQuery::default().view_url(true), "/products?view=list");
        assert_eq!(CatalogQuery::default().page_url(1), "/products");
    }

    #[test]
    fn test_review_validation() {
        let mut form = ReviewForm {
            rating: 5,
            title: "Beautiful".to_owned(),
            comment: "Lovely fabric.".to_owned(),
        };
        assert!(form.validate().is_ok());

        form.rating = 0;
        assert!(form.validate().is_err());

        form.rating = 4;
        form.comment = "   ".to_owned();
        assert!(form.validate().is_err());
    }
}
