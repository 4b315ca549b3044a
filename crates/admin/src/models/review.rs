//! Reviews awaiting or past moderation.

use chrono::{DateTime, Utc};

use elegance_core::{ProductId, ReviewId, ReviewStatus};

/// A review joined with the name and slug of its product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}
