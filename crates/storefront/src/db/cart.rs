//! Persistent cart repository for signed-in customers.
//!
//! Guest carts live in the session; see `services::cart`.

use sqlx::PgPool;

use elegance_core::cart::{CartLine, MAX_LINE_QUANTITY};
use elegance_core::catalog::Product;
use elegance_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use super::products::PRODUCT_COLUMNS;

#[derive(sqlx::FromRow)]
struct CartRow {
    cart_item_id: CartItemId,
    quantity: i32,
    size: Option<String>,
    color: Option<String>,
    #[sqlx(flatten)]
    product: Product,
}

impl From<CartRow> for CartLine {
    fn from(row: CartRow) -> Self {
        Self {
            key: row.cart_item_id.to_string(),
            product: row.product,
            quantity: u32::try_from(row.quantity).unwrap_or(1),
            size: row.size,
            color: row.color,
        }
    }
}

/// Repository for `cart_items`.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lines in the user's cart, oldest first, with product details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let sql = format!(
            "SELECT ci.id AS cart_item_id, ci.quantity, ci.size, ci.color, {PRODUCT_COLUMNS} \
             FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             WHERE ci.user_id = $1 \
             ORDER BY ci.created_at, ci.id"
        );
        let rows = sqlx::query_as::<_, CartRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// Total quantity across all lines, for the header badge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_items WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Number of distinct lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn line_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Whether a line with this product and options already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM cart_items
                WHERE user_id = $1 AND product_id = $2
                  AND size IS NOT DISTINCT FROM $3
                  AND color IS NOT DISTINCT FROM $4
            )
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .bind(color)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Add to a line, merging with an existing line of the same options.
    ///
    /// The merged quantity is capped at the per-line maximum.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<CartItemId, RepositoryError> {
        let max = i32::try_from(MAX_LINE_QUANTITY).unwrap_or(10);
        let quantity = i32::try_from(quantity).unwrap_or(max).min(max);

        let id: CartItemId = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity, size, color)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id, size, color)
            DO UPDATE SET quantity = LEAST(cart_items.quantity + EXCLUDED.quantity, $6)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(size)
        .bind(color)
        .bind(max)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Set a line's quantity. Returns `false` if the line isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let quantity = i32::try_from(quantity.min(MAX_LINE_QUANTITY)).unwrap_or(1);
        let result =
            sqlx::query("UPDATE cart_items SET quantity = $3 WHERE id = $2 AND user_id = $1")
                .bind(user_id)
                .bind(item_id)
                .bind(quantity)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a line. Returns `false` if the line isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $2 AND user_id = $1")
            .bind(user_id)
            .bind(item_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
