//! Customer repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use elegance_core::UserId;
use elegance_core::catalog::Page;

use super::{RepositoryError, contains_pattern};
use crate::models::CustomerRow;

/// User columns with order aggregates; cancelled orders don't count.
const CUSTOMER_SELECT: &str = "SELECT u.id, u.email, u.first_name, u.last_name, u.phone, u.role, \
     COUNT(o.id) AS order_count, \
     COALESCE(SUM(o.total), 0) AS total_spent, \
     MAX(o.created_at) AS last_order_at, \
     u.created_at \
     FROM users u \
     LEFT JOIN orders o ON o.user_id = u.id AND o.status <> 'cancelled'";

/// Filters for the customers page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Matched against first name, last name, full name, and email.
    pub search: Option<String>,
}

/// Repository for customer lookups.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of users, newest first, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(
        &self,
        filter: &CustomerFilter,
        page: Page,
    ) -> Result<(Vec<CustomerRow>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(CUSTOMER_SELECT);
        push_filters(&mut query, filter);
        query
            .push(" GROUP BY u.id ORDER BY u.created_at DESC, u.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<CustomerRow>()
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Look up one user with their order aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<CustomerRow>, RepositoryError> {
        let sql = format!("{CUSTOMER_SELECT} WHERE u.id = $1 GROUP BY u.id");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }
}

/// Append the `WHERE` clause for a customer filter.
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &CustomerFilter) {
    query.push(" WHERE TRUE");

    if let Some(term) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let pattern = contains_pattern(term);
        query
            .push(" AND (u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR (u.first_name || ' ' || u.last_name) ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_filters() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        push_filters(&mut query, &CustomerFilter::default());
        assert_eq!(query.sql(), "SELECT COUNT(*) FROM users u WHERE TRUE");

        let filter = CustomerFilter {
            search: Some("Fatima".to_owned()),
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        push_filters(&mut query, &filter);
        let sql = query.sql();
        assert!(sql.contains("u.email ILIKE $1"));
        assert!(sql.contains("(u.first_name || ' ' || u.last_name) ILIKE $2"));
    }
}
