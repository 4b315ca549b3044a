//! Product reviews.

use chrono::{DateTime, Utc};
use serde::Serialize;

use elegance_core::{ProductId, ReviewId, ReviewStatus, UserId};

/// A customer review of a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub reviewer_name: String,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}
