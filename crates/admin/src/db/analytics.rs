//! Aggregate queries for the dashboard and analytics pages.
//!
//! Revenue figures leave out cancelled orders.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use elegance_core::{Money, OrderStatus};

use super::RepositoryError;

/// Months covered by the monthly series.
pub const MONTHS: i32 = 12;

/// Headline numbers on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct DashboardTotals {
    pub revenue: Money,
    pub orders: i64,
    pub pending_orders: i64,
    pub customers: i64,
    pub products: i64,
}

/// Revenue and order count for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct MonthlyRevenue {
    pub month: DateTime<Utc>,
    pub revenue: Money,
    pub orders: i64,
}

/// A count for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct MonthlyCount {
    pub month: DateTime<Utc>,
    pub count: i64,
}

/// Number of orders in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// A best-selling product by units.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TopProduct {
    pub product_name: String,
    pub units: i64,
    pub revenue: Money,
}

/// Revenue per category.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CategorySales {
    pub category: String,
    pub revenue: Money,
}

/// Repository for reporting queries.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store-wide totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self) -> Result<DashboardTotals, RepositoryError> {
        let totals = sqlx::query_as::<_, DashboardTotals>(
            r"
            SELECT
                (SELECT COALESCE(SUM(total), 0) FROM orders WHERE status <> 'cancelled') AS revenue,
                (SELECT COUNT(*) FROM orders) AS orders,
                (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders,
                (SELECT COUNT(*) FROM users WHERE role = 'customer') AS customers,
                (SELECT COUNT(*) FROM products) AS products
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(totals)
    }

    /// Revenue and orders for each of the last [`MONTHS`] months, oldest
    /// first. Months without orders are included with zeros.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_revenue(&self) -> Result<Vec<MonthlyRevenue>, RepositoryError> {
        let rows = sqlx::query_as::<_, MonthlyRevenue>(
            r"
            SELECT m.month,
                   COALESCE(SUM(o.total), 0) AS revenue,
                   COUNT(o.id) AS orders
            FROM generate_series(
                date_trunc('month', NOW()) - make_interval(months => $1 - 1),
                date_trunc('month', NOW()),
                INTERVAL '1 month'
            ) AS m(month)
            LEFT JOIN orders o
                ON date_trunc('month', o.created_at) = m.month AND o.status <> 'cancelled'
            GROUP BY m.month
            ORDER BY m.month
            ",
        )
        .bind(MONTHS)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// New customer accounts for each of the last [`MONTHS`] months.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_signups(&self) -> Result<Vec<MonthlyCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, MonthlyCount>(
            r"
            SELECT m.month, COUNT(u.id) AS count
            FROM generate_series(
                date_trunc('month', NOW()) - make_interval(months => $1 - 1),
                date_trunc('month', NOW()),
                INTERVAL '1 month'
            ) AS m(month)
            LEFT JOIN users u
                ON date_trunc('month', u.created_at) = m.month AND u.role = 'customer'
            GROUP BY m.month
            ORDER BY m.month
            ",
        )
        .bind(MONTHS)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Order counts per status, in lifecycle order. Statuses with no orders
    /// are included with zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders_by_status(&self) -> Result<Vec<StatusCount>, RepositoryError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            r"
            SELECT s.status, COUNT(o.id) AS count
            FROM unnest(enum_range(NULL::order_status)) AS s(status)
            LEFT JOIN orders o ON o.status = s.status
            GROUP BY s.status
            ORDER BY s.status
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(counts)
    }

    /// Best sellers by units sold in non-cancelled orders.
    ///
    /// Grouped by the purchase-time product name, so deleted products still
    /// show up.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(&self, limit: i64) -> Result<Vec<TopProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r"
            SELECT i.product_name,
                   SUM(i.quantity)::BIGINT AS units,
                   SUM(i.unit_price * i.quantity) AS revenue
            FROM order_items i
            JOIN orders o ON o.id = i.order_id
            WHERE o.status <> 'cancelled'
            GROUP BY i.product_name
            ORDER BY units DESC, revenue DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Revenue per category from non-cancelled orders, largest first.
    ///
    /// Lines whose product was deleted or uncategorised are grouped together.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_by_category(&self) -> Result<Vec<CategorySales>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategorySales>(
            r"
            SELECT COALESCE(c.name, 'Uncategorised') AS category,
                   SUM(i.unit_price * i.quantity) AS revenue
            FROM order_items i
            JOIN orders o ON o.id = i.order_id
            LEFT JOIN products p ON p.id = i.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE o.status <> 'cancelled'
            GROUP BY 1
            ORDER BY revenue DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
