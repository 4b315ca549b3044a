//! Product repository: catalog editing and stock levels.

use sqlx::{PgPool, Postgres, QueryBuilder};

use elegance_core::catalog::{LOW_STOCK_THRESHOLD, Page, Product, StockLevel};
use elegance_core::{CategoryId, Money, ProductId};

use super::{RepositoryError, conflict_on_unique, contains_pattern};

/// Columns selected for a [`Product`], on the `products` table aliased `p`.
const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.name, p.slug, p.description, \
     p.sku, p.price, p.sale_price, p.stock_quantity, p.images, p.sizes, p.colors, \
     p.is_active, p.is_featured, p.created_at";

/// A product with its category name, for list pages.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    #[sqlx(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
}

/// Status filter on the products page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Active,
    Inactive,
    OutOfStock,
}

impl ProductStatus {
    pub const ALL: &'static [Self] = &[Self::Active, Self::Inactive, Self::OutOfStock];

    /// Parse a query value. Unknown values mean "any status".
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "out_of_stock" => Some(Self::OutOfStock),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::OutOfStock => "out_of_stock",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::OutOfStock => "Out of stock",
        }
    }
}

/// Filters for the products and inventory pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductAdminFilter {
    /// Matched against name and SKU.
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub status: Option<ProductStatus>,
    pub stock: Option<StockLevel>,
}

/// Validated values for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
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
}

/// Product counts by stock level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct InventoryCounts {
    pub total: i64,
    pub in_stock: i64,
    pub low_stock: i64,
    pub out_of_stock: i64,
}

/// Repository for product administration.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products, newest first, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(
        &self,
        filter: &ProductAdminFilter,
        page: Page,
    ) -> Result<(Vec<ProductRow>, i64), RepositoryError> {
        self.list_ordered(filter, page, "p.created_at DESC, p.id DESC")
            .await
    }

    /// One page of products ordered by stock, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn inventory(
        &self,
        filter: &ProductAdminFilter,
        page: Page,
    ) -> Result<(Vec<ProductRow>, i64), RepositoryError> {
        self.list_ordered(filter, page, "p.stock_quantity ASC, p.name ASC")
            .await
    }

    async fn list_ordered(
        &self,
        filter: &ProductAdminFilter,
        page: Page,
        order_by: &'static str,
    ) -> Result<(Vec<ProductRow>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query
            .push(PRODUCT_COLUMNS)
            .push(", c.name AS category_name FROM products p")
            .push(" LEFT JOIN categories c ON c.id = p.category_id");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(order_by)
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Look up a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug or SKU is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, fields: &ProductFields) -> Result<ProductId, RepositoryError> {
        sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO products (
                category_id, name, slug, description, sku, price, sale_price,
                stock_quantity, images, sizes, colors, is_active, is_featured
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            ",
        )
        .bind(fields.category_id)
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(&fields.sku)
        .bind(fields.price)
        .bind(fields.sale_price)
        .bind(fields.stock_quantity)
        .bind(&fields.images)
        .bind(&fields.sizes)
        .bind(&fields.colors)
        .bind(fields.is_active)
        .bind(fields.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "A product with this slug or SKU already exists"))
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug or SKU is taken.
    pub async fn update(&self, id: ProductId, fields: &ProductFields) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products SET
                category_id = $2, name = $3, slug = $4, description = $5, sku = $6,
                price = $7, sale_price = $8, stock_quantity = $9, images = $10,
                sizes = $11, colors = $12, is_active = $13, is_featured = $14,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(fields.category_id)
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(&fields.sku)
        .bind(fields.price)
        .bind(fields.sale_price)
        .bind(fields.stock_quantity)
        .bind(&fields.images)
        .bind(&fields.sizes)
        .bind(&fields.colors)
        .bind(fields.is_active)
        .bind(fields.is_featured)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "A product with this slug or SKU already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product. Past order lines keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip a product between active and hidden, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn toggle_active(&self, id: ProductId) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            r"
            UPDATE products SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING is_active
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Set the stock on hand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_stock(&self, id: ProductId, quantity: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET stock_quantity = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Products below the low-stock threshold, emptiest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.stock_quantity < $1 \
             ORDER BY p.stock_quantity ASC, p.name ASC LIMIT $2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(LOW_STOCK_THRESHOLD)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Count products by stock level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inventory_counts(&self) -> Result<InventoryCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, InventoryCounts>(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE stock_quantity >= $1) AS in_stock,
                COUNT(*) FILTER (WHERE stock_quantity > 0 AND stock_quantity < $1) AS low_stock,
                COUNT(*) FILTER (WHERE stock_quantity = 0) AS out_of_stock
            FROM products
            ",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(self.pool)
        .await?;
        Ok(counts)
    }
}

/// Append the `WHERE` clause for an admin product filter.
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductAdminFilter) {
    query.push(" WHERE TRUE");

    if let Some(term) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let pattern = contains_pattern(term);
        query
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category {
        query.push(" AND p.category_id = ").push_bind(category);
    }
    match filter.status {
        Some(ProductStatus::Active) => {
            query.push(" AND p.is_active");
        }
        Some(ProductStatus::Inactive) => {
            query.push(" AND NOT p.is_active");
        }
        Some(ProductStatus::OutOfStock) => {
            query.push(" AND p.stock_quantity = 0");
        }
        None => {}
    }
    match filter.stock {
        Some(StockLevel::InStock) => {
            query
                .push(" AND p.stock_quantity >= ")
                .push_bind(LOW_STOCK_THRESHOLD);
        }
        Some(StockLevel::LowStock) => {
            query
                .push(" AND p.stock_quantity > 0 AND p.stock_quantity < ")
                .push_bind(LOW_STOCK_THRESHOLD);
        }
        Some(StockLevel::OutOfStock) => {
            query.push(" AND p.stock_quantity = 0");
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_status_parse() {
        for status in ProductStatus::ALL {
            assert_eq!(ProductStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(ProductStatus::parse("archived"), None);
        assert_eq!(ProductStatus::parse(""), None);
    }

    #[test]
    fn test_push_filters_empty() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut query, &ProductAdminFilter::default());
        assert_eq!(query.sql(), "SELECT COUNT(*) FROM products p WHERE TRUE");
    }

    #[test]
    fn test_push_filters_search_and_status() {
        let filter = ProductAdminFilter {
            search: Some("  silk ".to_owned()),
            category: Some(CategoryId::new(3)),
            status: Some(ProductStatus::Inactive),
            stock: Some(StockLevel::LowStock),
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut query, &filter);
        let sql = query.sql();
        assert!(sql.contains("p.name ILIKE $1 OR p.sku ILIKE $2"));
        assert!(sql.contains("p.category_id = $3"));
        assert!(sql.contains("NOT p.is_active"));
        assert!(sql.contains("p.stock_quantity > 0 AND p.stock_quantity < $4"));
    }

    #[test]
    fn test_push_filters_ignores_blank_search() {
        let filter = ProductAdminFilter {
            search: Some("   ".to_owned()),
            ..ProductAdminFilter::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut query, &filter);
        assert!(!query.sql().contains("ILIKE"));
    }
}
