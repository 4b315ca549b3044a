//! Order repository.
//!
//! Orders are created in one transaction: stock is decremented with a guard
//! against overselling, the order and its item snapshots are inserted, and the
//! customer's cart is emptied.

use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::types::Json;

use elegance_core::cart::CartLine;
use elegance_core::checkout::ValidatedCheckout;
use elegance_core::pricing::OrderTotals;
use elegance_core::{OrderId, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderItem, OrderSummary};

const ORDER_COLUMNS: &str = "id, user_id, email, first_name, last_name, phone, \
     shipping_address, billing_address, subtotal, shipping_cost, discount_amount, tax_amount, \
     total, shipping_method, payment_method, payment_status, promo_code, status, created_at";

/// Everything needed to place an order.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub user_id: Option<UserId>,
    pub checkout: &'a ValidatedCheckout,
    pub lines: &'a [CartLine],
    pub totals: &'a OrderTotals,
    pub promo_code: Option<&'a str>,
}

/// Filters for the order history page.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderHistoryFilter {
    pub status: Option<OrderStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Repository for `orders` and `order_items`.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InsufficientStock` naming the first product
    /// that could not cover its line; nothing is written in that case.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, order: &NewOrder<'_>) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let checkout = order.checkout;
        let address = &checkout.shipping_address;

        for line in order.lines {
            let quantity = i32::try_from(line.quantity).unwrap_or(i32::MAX);
            let result = sqlx::query(
                r"
                UPDATE products
                SET stock_quantity = stock_quantity - $2, updated_at = NOW()
                WHERE id = $1 AND is_active AND stock_quantity >= $2
                ",
            )
            .bind(line.product.id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::InsufficientStock(line.product.name.clone()));
            }
        }

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO orders
                (user_id, email, first_name, last_name, phone,
                 shipping_address, billing_address,
                 subtotal, shipping_cost, discount_amount, tax_amount, total,
                 shipping_method, payment_method, promo_code, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 'pending')
            RETURNING id
            ",
        )
        .bind(order.user_id)
        .bind(checkout.email.as_str())
        .bind(&address.first_name)
        .bind(&address.last_name)
        .bind(checkout.phone.as_str())
        .bind(Json(address))
        .bind(checkout.billing_address.as_ref().map(Json))
        .bind(order.totals.subtotal)
        .bind(order.totals.shipping)
        .bind(order.totals.discount)
        .bind(order.totals.tax)
        .bind(order.totals.total)
        .bind(checkout.shipping_method)
        .bind(checkout.payment_method)
        .bind(order.promo_code)
        .fetch_one(&mut *tx)
        .await?;

        for line in order.lines {
            sqlx::query(
                r"
                INSERT INTO order_items
                    (order_id, product_id, product_name, product_image,
                     unit_price, quantity, size, color)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(order_id)
            .bind(line.product.id)
            .bind(&line.product.name)
            .bind(line.product.primary_image())
            .bind(line.unit_price())
            .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
            .bind(line.size.as_deref())
            .bind(line.color.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        if let Some(user_id) = order.user_id {
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        filter: OrderHistoryFilter,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.status, o.total, o.created_at,
                   COALESCE(SUM(oi.quantity), 0)::BIGINT AS item_count
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1
              AND ($2::order_status IS NULL OR o.status = $2)
              AND ($3::DATE IS NULL OR o.created_at >= $3::DATE)
              AND ($4::DATE IS NULL OR o.created_at < $4::DATE + 1)
            GROUP BY o.id
            ORDER BY o.created_at DESC
            ",
        )
        .bind(user_id)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Most recent orders for the account dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_for_user(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.status, o.total, o.created_at,
                   COALESCE(SUM(oi.quantity), 0)::BIGINT AS item_count
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Order count and lifetime spend (cancelled orders excluded from spend).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats_for_user(
        &self,
        user_id: UserId,
    ) -> Result<(i64, elegance_core::Money), RepositoryError> {
        let row: (i64, rust_decimal::Decimal) = sqlx::query_as(
            r"
            SELECT COUNT(*),
                   COALESCE(SUM(total) FILTER (WHERE status <> 'cancelled'), 0)
            FROM orders WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok((row.0, row.1.into()))
    }

    /// Fetch an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// Fetch an order only if it belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// Line items of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, product_id, product_name, product_image, unit_price, quantity, size, color
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// Cancel a pending or processing order and return its stock.
    ///
    /// Returns `false` when the order isn't the user's or can no longer be
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn cancel(&self, user_id: UserId, id: OrderId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE orders SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status IN ('pending', 'processing')
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            r"
            UPDATE products p
            SET stock_quantity = p.stock_quantity + returned.quantity, updated_at = NOW()
            FROM (
                SELECT product_id, SUM(quantity)::INTEGER AS quantity
                FROM order_items
                WHERE order_id = $1 AND product_id IS NOT NULL
                GROUP BY product_id
            ) returned
            WHERE returned.product_id = p.id
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
