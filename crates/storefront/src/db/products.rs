//! Product repository.
//!
//! The catalog listing is built with `QueryBuilder` so that optional filters
//! only add the clauses they need. Sort fragments come from
//! [`SortOrder::sql`], never from user input.

use sqlx::{PgPool, Postgres, QueryBuilder};

use elegance_core::ProductId;
use elegance_core::catalog::{Page, Product, ProductFilter, SortOrder};

use super::RepositoryError;

/// Columns selected for a [`Product`], on the `products` table aliased `p`.
pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.name, p.slug, p.description, \
     p.sku, p.price, p.sale_price, p.stock_quantity, p.images, p.sizes, p.colors, \
     p.is_active, p.is_featured, p.created_at";

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of active products matching `filter`, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: SortOrder,
        page: Page,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(PRODUCT_COLUMNS).push(" FROM products p");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(sort.sql())
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let products = query
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok((products, total))
    }

    /// Featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.is_active AND p.is_featured \
             ORDER BY p.created_at DESC LIMIT $1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Most recently added active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn newest(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.is_active ORDER BY p.created_at DESC LIMIT $1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Look up an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.slug = $1 AND p.is_active");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Look up a product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Fetch several products at once. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1)");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(raw)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Other active products from the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let Some(category_id) = product.category_id else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.is_active AND p.category_id = $1 AND p.id <> $2 \
             ORDER BY p.is_featured DESC, p.created_at DESC LIMIT $3"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category_id)
            .bind(product.id)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }
}

/// Append the `WHERE` clause for a catalog filter.
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    query.push(" WHERE p.is_active");

    if let Some(category) = filter.category {
        query.push(" AND p.category_id = ").push_bind(category);
    }
    if let Some(term) = filter.search_term() {
        query
            .push(" AND p.name ILIKE ")
            .push_bind(format!("%{}%", escape_like(term)));
    }
    if let Some(min) = filter.min_price {
        query
            .push(" AND LEAST(p.price, COALESCE(p.sale_price, p.price)) >= ")
            .push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query
            .push(" AND LEAST(p.price, COALESCE(p.sale_price, p.price)) <= ")
            .push_bind(max);
    }
    if !filter.sizes.is_empty() {
        query.push(" AND p.sizes && ").push_bind(filter.sizes.clone());
    }
    if !filter.colors.is_empty() {
        query.push(" AND p.colors && ").push_bind(filter.colors.clone());
    }
    if filter.in_stock {
        query.push(" AND p.stock_quantity > 0");
    }
    if filter.on_sale {
        query.push(" AND p.sale_price IS NOT NULL AND p.sale_price < p.price");
    }
    if filter.featured {
        query.push(" AND p.is_featured");
    }
}

/// Escape `LIKE` wildcards in user search text.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use elegance_core::CategoryId;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("abaya"), "abaya");
    }

    #[test]
    fn test_push_filters_only_adds_set_clauses() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut query, &ProductFilter::default());
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM products p WHERE p.is_active"
        );

        let filter = ProductFilter {
            category: Some(CategoryId::new(2)),
            search: Some(" silk ".to_owned()),
            sizes: vec!["M".to_owned()],
            in_stock: true,
            on_sale: true,
            ..ProductFilter::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut query, &filter);
        let sql = query.sql();
        assert!(sql.contains("p.category_id = $1"));
        assert!(sql.contains("p.name ILIKE $2"));
        assert!(sql.contains("p.sizes && $3"));
        assert!(sql.contains("p.stock_quantity > 0"));
        assert!(sql.contains("p.sale_price < p.price"));
        assert!(!sql.contains("p.colors"));
    }
}
