//! Review moderation.

use sqlx::{PgPool, Postgres, QueryBuilder};

use elegance_core::catalog::Page;
use elegance_core::{ReviewId, ReviewStatus};

use super::RepositoryError;
use crate::models::ReviewRow;

const REVIEW_SELECT: &str = "SELECT r.id, r.product_id, p.name AS product_name, \
     p.slug AS product_slug, r.reviewer_name, r.reviewer_email, r.rating, r.title, \
     r.comment, r.status, r.created_at \
     FROM reviews r JOIN products p ON p.id = r.product_id";

/// Repository for review moderation.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of reviews, newest first, optionally in one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(
        &self,
        status: Option<ReviewStatus>,
        page: Page,
    ) -> Result<(Vec<ReviewRow>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reviews r");
        push_status(&mut count_query, status);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(REVIEW_SELECT);
        push_status(&mut query, status);
        query
            .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<ReviewRow>()
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Number of reviews waiting for moderation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pending_count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reviews WHERE status = 'pending'",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Approve or reject a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn set_status(
        &self,
        id: ReviewId,
        status: ReviewStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE reviews SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn push_status(query: &mut QueryBuilder<'_, Postgres>, status: Option<ReviewStatus>) {
    if let Some(status) = status {
        query.push(" WHERE r.status = ").push_bind(status);
    }
}
