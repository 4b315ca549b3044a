//! Review repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use elegance_core::reviews::ReviewSort;
use elegance_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::Review;

/// A review as submitted, before moderation.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub rating: i16,
    pub title: String,
    pub comment: String,
}

/// Repository for `reviews`.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Approved reviews for a product in the given order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn approved_for_product(
        &self,
        product_id: ProductId,
        sort: ReviewSort,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = approved_query(product_id, sort)
            .build_query_as::<Review>()
            .fetch_all(self.pool)
            .await?;
        Ok(reviews)
    }

    /// Submit a review. New reviews wait for moderation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, review: &NewReview) -> Result<ReviewId, RepositoryError> {
        let id: ReviewId = sqlx::query_scalar(
            r"
            INSERT INTO reviews
                (product_id, user_id, reviewer_name, reviewer_email, rating, title, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(&review.reviewer_name)
        .bind(&review.reviewer_email)
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.comment)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }
}

fn approved_query(product_id: ProductId, sort: ReviewSort) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(
        "SELECT id, product_id, user_id, reviewer_name, rating, title, comment, status, created_at \
         FROM reviews WHERE status = 'approved' AND product_id = ",
    );
    query
        .push_bind(product_id)
        .push(" ORDER BY ")
        .push(sort.sql());
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approved_query_order() {
        let query = approved_query(ProductId::new(1), ReviewSort::Lowest);
        assert!(query.sql().contains("product_id = $1"));
        assert!(query.sql().ends_with("ORDER BY rating ASC, created_at DESC, id DESC"));

        let query = approved_query(ProductId::new(1), ReviewSort::default());
        assert!(query.sql().ends_with("ORDER BY created_at DESC, id DESC"));
    }
}
