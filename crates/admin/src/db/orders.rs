//! Order repository: listing, detail, and status changes.
//!
//! Cancelling an order through a status change returns its stock, the same
//! as a customer cancelling from their account.

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};

use elegance_core::catalog::Page;
use elegance_core::{OrderId, OrderStatus, UserId};

use super::{RepositoryError, contains_pattern};
use crate::models::{Order, OrderItem, OrderRow};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.email, o.first_name, o.last_name, o.phone, \
     o.shipping_address, o.billing_address, o.subtotal, o.shipping_cost, o.discount_amount, \
     o.tax_amount, o.total, o.shipping_method, o.payment_method, o.payment_status, \
     o.promo_code, o.status, o.created_at, o.updated_at";

const ROW_SELECT: &str = "SELECT o.id, o.email, o.first_name, o.last_name, o.status, \
     o.payment_status, o.total, o.created_at, \
     (SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM order_items WHERE order_id = o.id) AS item_count \
     FROM orders o";

/// Filters for the orders page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// An order number (`ORD-000042` or `42`) or part of the customer email.
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    /// Inclusive start date (UTC).
    pub from: Option<NaiveDate>,
    /// Inclusive end date (UTC).
    pub to: Option<NaiveDate>,
    pub customer: Option<UserId>,
}

/// Errors from [`OrderRepository::update_status`].
#[derive(Debug, thiserror::Error)]
pub enum StatusChangeError {
    #[error("order not found")]
    NotFound,
    #[error("cannot change a {from} order to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for StatusChangeError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Repository for order administration.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of orders, newest first, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> Result<(Vec<OrderRow>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(ROW_SELECT);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<OrderRow>()
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<OrderRow>, RepositoryError> {
        let sql = format!("{ROW_SELECT} ORDER BY o.created_at DESC, o.id DESC LIMIT $1");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Look up an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// Lines of an order, in the order they were added.
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

    /// Move an order to `next` if its current status allows it.
    ///
    /// The current status is re-read under a row lock so two admins can't
    /// both apply a transition from the same starting point. Cancelling
    /// returns the order's stock.
    ///
    /// # Errors
    ///
    /// Returns `StatusChangeError::NotFound` if the order doesn't exist.
    /// Returns `StatusChangeError::InvalidTransition` if the move isn't allowed.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<OrderStatus, StatusChangeError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StatusChangeError::NotFound)?;

        if !current.can_transition_to(next) {
            return Err(StatusChangeError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        if next == OrderStatus::Cancelled {
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
        }

        tx.commit().await?;
        Ok(current)
    }
}

/// Append the `WHERE` clause for an order filter.
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    query.push(" WHERE TRUE");

    if let Some(term) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        query
            .push(" AND (o.email ILIKE ")
            .push_bind(contains_pattern(term));
        if let Some(id) = OrderId::parse_number(term) {
            query.push(" OR o.id = ").push_bind(id);
        }
        query.push(")");
    }
    if let Some(status) = filter.status {
        query.push(" AND o.status = ").push_bind(status);
    }
    if let Some(from) = filter.from {
        query.push(" AND o.created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to.and_then(|d| d.succ_opt()) {
        query.push(" AND o.created_at < ").push_bind(to);
    }
    if let Some(customer) = filter.customer {
        query.push(" AND o.user_id = ").push_bind(customer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_filters_empty() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        push_filters(&mut query, &OrderFilter::default());
        assert_eq!(query.sql(), "SELECT COUNT(*) FROM orders o WHERE TRUE");
    }

    #[test]
    fn test_search_matches_order_number_or_email() {
        let filter = OrderFilter {
            search: Some("ORD-000042".to_owned()),
            ..OrderFilter::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        push_filters(&mut query, &filter);
        assert!(query.sql().contains("(o.email ILIKE $1 OR o.id = $2)"));

        let filter = OrderFilter {
            search: Some("mariam@".to_owned()),
            ..OrderFilter::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        push_filters(&mut query, &filter);
        assert!(query.sql().contains("(o.email ILIKE $1)"));
        assert!(!query.sql().contains("o.id ="));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Shipped),
            from: NaiveDate::from_ymd_opt(2025, 3, 1),
            to: NaiveDate::from_ymd_opt(2025, 3, 31),
            ..OrderFilter::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        push_filters(&mut query, &filter);
        let sql = query.sql();
        assert!(sql.contains("o.status = $1"));
        assert!(sql.contains("o.created_at >= $2"));
        assert!(sql.contains("o.created_at < $3"));
    }
}
