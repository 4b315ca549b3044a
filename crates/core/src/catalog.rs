//! Catalog records, filters, sort orders, and pagination.
//!
//! The storefront turns a [`ProductFilter`] into SQL; [`ProductFilter::matches`]
//! states the same predicate in memory so the two can be checked against each
//! other and so small lists (related products, wishlist) can be filtered
//! without another query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing;
use crate::types::{CategoryId, Money, ProductId};

/// Sizes offered across the catalog, in display order.
pub const SIZES: &[&str] = &["XS", "S", "M", "L", "XL", "XXL"];

/// Colors offered across the catalog, in display order.
pub const COLORS: &[&str] = &["Black", "Navy Blue", "Gray", "Brown", "Dark Green", "Burgundy"];

/// Stock level below which a product counts as running low.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Money,
    pub sale_price: Option<Money>,
    pub stock_quantity: i32,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Price charged per unit right now.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        pricing::effective_unit_price(self.price, self.sale_price)
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.effective_price() < self.price
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        pricing::discount_percent(self.price, self.sale_price)
    }

    /// First image, used for cards and cart thumbnails.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        StockLevel::from_quantity(self.stock_quantity)
    }
}

/// Coarse stock state for badges and the inventory screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockLevel {
    pub const ALL: &'static [Self] = &[Self::InStock, Self::LowStock, Self::OutOfStock];

    #[must_use]
    pub const fn from_quantity(quantity: i32) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity < LOW_STOCK_THRESHOLD {
            Self::LowStock
        } else {
            Self::InStock
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::LowStock => "low_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }

    /// Parse an [`as_str`](Self::as_str) value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|level| level.as_str() == value.trim())
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::LowStock => "Low Stock",
            Self::OutOfStock => "Out of Stock",
        }
    }
}

/// Catalog search criteria.
///
/// Empty `sizes`/`colors` mean "any". A product passes a size or color filter
/// when it offers at least one of the selected values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub in_stock: bool,
    pub on_sale: bool,
    pub featured: bool,
}

impl ProductFilter {
    /// Search text, trimmed, or `None` if blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether any criterion is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.category.is_some()
            || self.search_term().is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || !self.sizes.is_empty()
            || !self.colors.is_empty()
            || self.in_stock
            || self.on_sale
            || self.featured
    }

    /// In-memory form of the catalog query. Inactive products never match.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !product.is_active {
            return false;
        }
        if self.category.is_some() && product.category_id != self.category {
            return false;
        }
        if let Some(term) = self.search_term()
            && !product.name.to_lowercase().contains(&term.to_lowercase())
        {
            return false;
        }

        let price = product.effective_price();
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }

        if !self.sizes.is_empty() && !product.sizes.iter().any(|s| self.sizes.contains(s)) {
            return false;
        }
        if !self.colors.is_empty() && !product.colors.iter().any(|c| self.colors.contains(c)) {
            return false;
        }

        (!self.in_stock || product.in_stock())
            && (!self.on_sale || product.is_on_sale())
            && (!self.featured || product.is_featured)
    }
}

/// Catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    Newest,
    Oldest,
}

impl SortOrder {
    pub const ALL: &'static [Self] = &[
        Self::NameAsc,
        Self::NameDesc,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Newest,
        Self::Oldest,
    ];

    /// Parse a `sort` query value. Unknown values give the default order.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "name_desc" => Self::NameDesc,
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "newest" | "created_desc" | "created_at_desc" => Self::Newest,
            "oldest" | "created_asc" | "created_at_asc" => Self::Oldest,
            _ => Self::NameAsc,
        }
    }

    /// Query-string spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NameAsc => "Name: A to Z",
            Self::NameDesc => "Name: Z to A",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::Newest => "Newest First",
            Self::Oldest => "Oldest First",
        }
    }

    /// `ORDER BY` clause for the `products` table (aliased `p`).
    ///
    /// Only these fixed strings ever reach the query text.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::NameAsc => "LOWER(p.name) ASC, p.id ASC",
            Self::NameDesc => "LOWER(p.name) DESC, p.id DESC",
            Self::PriceAsc => "LEAST(p.price, COALESCE(p.sale_price, p.price)) ASC, p.id ASC",
            Self::PriceDesc => "LEAST(p.price, COALESCE(p.sale_price, p.price)) DESC, p.id DESC",
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::Oldest => "p.created_at ASC, p.id ASC",
        }
    }

    /// Sort products in memory the same way [`SortOrder::sql`] does.
    /// Names compare without regard to case.
    pub fn sort(self, products: &mut [Product]) {
        match self {
            Self::NameAsc => products.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then(a.id.cmp(&b.id))
            }),
            Self::NameDesc => products.sort_by(|a, b| {
                b.name
                    .to_lowercase()
                    .cmp(&a.name.to_lowercase())
                    .then(b.id.cmp(&a.id))
            }),
            Self::PriceAsc => products.sort_by(|a, b| {
                a.effective_price()
                    .cmp(&b.effective_price())
                    .then(a.id.cmp(&b.id))
            }),
            Self::PriceDesc => products.sort_by(|a, b| {
                b.effective_price()
                    .cmp(&a.effective_price())
                    .then(b.id.cmp(&a.id))
            }),
            Self::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
            Self::Oldest => products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))),
        }
    }
}

/// A requested page of results (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u32,
    per_page: u32,
}

impl Page {
    /// Products per catalog page.
    pub const DEFAULT_PER_PAGE: u32 = 12;
    pub const MAX_PER_PAGE: u32 = 100;
    /// Highest page number accepted, so offsets fit a Postgres `INTEGER`.
    pub const MAX_PAGE: u32 = 2_147_483_647;

    /// Page numbers are clamped to `1..=MAX_PAGE`; `per_page` to `1..=100`.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, Self::MAX_PAGE),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub const fn number(self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(self) -> i64 {
        self.per_page as i64
    }

    #[must_use]
    pub const fn offset(self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    /// Navigation info once the total row count is known.
    #[must_use]
    pub fn info(self, total: i64) -> PageInfo {
        let total = u64::try_from(total).unwrap_or(0);
        let total_pages = u32::try_from(total.div_ceil(u64::from(self.per_page))).unwrap_or(u32::MAX);
        PageInfo {
            page: self.page,
            per_page: self.per_page,
            total,
            total_pages,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, Self::DEFAULT_PER_PAGE)
    }
}

/// Pagination state for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PageInfo {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// 1-based index of the first item on this page, 0 when empty.
    #[must_use]
    pub fn first_item(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page) + 1
        }
    }

    #[must_use]
    pub fn last_item(&self) -> u64 {
        (u64::from(self.page) * u64::from(self.per_page)).min(self.total)
    }

    /// Page numbers to show, with at most two either side of the current one.
    #[must_use]
    pub fn window(&self) -> Vec<u32> {
        let start = self.page.saturating_sub(2).max(1);
        let end = self.page.saturating_add(2).min(self.total_pages);
        (start..=end).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn product(id: i32, name: &str, price: i64, sale: Option<i64>) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: Some(CategoryId::new(1)),
            name: name.to_owned(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            sku: None,
            price: Money::from_cents(price * 100),
            sale_price: sale.map(|s| Money::from_cents(s * 100)),
            stock_quantity: 5,
            images: vec![],
            sizes: vec!["S".to_owned(), "M".to_owned()],
            colors: vec!["Black".to_owned()],
            is_active: true,
            is_featured: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_sort_parse_defaults_to_name() {
        assert_eq!(SortOrder::parse("price_desc"), SortOrder::PriceDesc);
        assert_eq!(SortOrder::parse("created_at_desc"), SortOrder::Newest);
        assert_eq!(SortOrder::parse("; DROP TABLE products"), SortOrder::NameAsc);
        for order in SortOrder::ALL {
            assert_eq!(SortOrder::parse(order.as_str()), *order);
        }
    }

    #[test]
    fn test_page_math() {
        let page = Page::new(Some(3), 12);
        assert_eq!(page.offset(), 24);
        assert_eq!(page.limit(), 12);

        let info = page.info(30);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_prev());
        assert!(!info.has_next());
        assert_eq!(info.first_item(), 25);
        assert_eq!(info.last_item(), 30);
    }

    #[test]
    fn test_huge_page_number_is_clamped() {
        let page = Page::new(Some(u32::MAX), 12);
        assert_eq!(page.number(), Page::MAX_PAGE);
        assert!(page.offset() > 0);

        let info = page.info(30);
        assert!(info.window().is_empty());
        assert!(!info.has_next());

        let info = PageInfo {
            page: u32::MAX,
            per_page: 12,
            total: u64::MAX,
            total_pages: u32::MAX,
        };
        assert_eq!(info.window(), vec![u32::MAX - 2, u32::MAX - 1, u32::MAX]);
    }

    #[test]
    fn test_page_clamps_inputs() {
        let page = Page::new(Some(0), 0);
        assert_eq!(page.number(), 1);
        assert_eq!(page.limit(), 1);
        assert_eq!(Page::default().limit(), 12);
        assert_eq!(Page::default().info(0).first_item(), 0);
    }

    #[test]
    fn test_page_window() {
        let info = Page::new(Some(5), 10).info(200);
        assert_eq!(info.window(), vec![3, 4, 5, 6, 7]);
        let info = Page::new(Some(1), 10).info(15);
        assert_eq!(info.window(), vec![1, 2]);
    }

    #[test]
    fn test_filter_price_uses_sale_price() {
        let p = product(1, "Classic Abaya", 120, Some(90));
        let filter = ProductFilter {
            max_price: Some(Money::from_cents(10_000)),
            ..ProductFilter::default()
        };
        assert!(filter.matches(&p));

        let filter = ProductFilter {
            min_price: Some(Money::from_cents(10_000)),
            ..ProductFilter::default()
        };
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_filter_sizes_match_any() {
        let p = product(1, "Classic Abaya", 120, None);
        let filter = ProductFilter {
            sizes: vec!["M".to_owned(), "XXL".to_owned()],
            ..ProductFilter::default()
        };
        assert!(filter.matches(&p));

        let filter = ProductFilter {
            colors: vec!["Burgundy".to_owned()],
            ..ProductFilter::default()
        };
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_filter_search_and_flags() {
        let mut p = product(1, "Embroidered Abaya", 120, None);
        let filter = ProductFilter {
            search: Some("  EMBROID ".to_owned()),
            ..ProductFilter::default()
        };
        assert!(filter.is_active());
        assert!(filter.matches(&p));

        let on_sale = ProductFilter {
            on_sale: true,
            ..ProductFilter::default()
        };
        assert!(!on_sale.matches(&p));

        p.stock_quantity = 0;
        let in_stock = ProductFilter {
            in_stock: true,
            ..ProductFilter::default()
        };
        assert!(!in_stock.matches(&p));

        p.is_active = false;
        assert!(!ProductFilter::default().matches(&p));
    }

    #[test]
    fn test_sort_in_memory() {
        let mut products = vec![
            product(1, "B", 50, None),
            product(2, "A", 100, Some(40)),
            product(3, "C", 45, None),
        ];
        SortOrder::PriceAsc.sort(&mut products);
        let ids: Vec<i32> = products.iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        SortOrder::NameDesc.sort(&mut products);
        let ids: Vec<i32> = products.iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let mut products = vec![
            product(1, "abaya", 50, None),
            product(2, "Zipped Jilbab", 50, None),
            product(3, "Belted Kaftan", 50, None),
        ];
        SortOrder::NameAsc.sort(&mut products);
        let ids: Vec<i32> = products.iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3, 2]);

        SortOrder::NameDesc.sort(&mut products);
        let ids: Vec<i32> = products.iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(SortOrder::NameAsc.sql().starts_with("LOWER(p.name)"));
    }

    #[test]
    fn test_stock_level() {
        assert_eq!(StockLevel::from_quantity(0), StockLevel::OutOfStock);
        assert_eq!(StockLevel::from_quantity(9), StockLevel::LowStock);
        assert_eq!(StockLevel::from_quantity(10), StockLevel::InStock);
    }

    #[test]
    fn test_stock_level_parse() {
        assert_eq!(StockLevel::parse("low_stock"), Some(StockLevel::LowStock));
        assert_eq!(StockLevel::parse(" out_of_stock "), Some(StockLevel::OutOfStock));
        assert_eq!(StockLevel::parse("plenty"), None);
    }
}
