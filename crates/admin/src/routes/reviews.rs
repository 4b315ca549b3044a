//! Review moderation handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use elegance_core::catalog::Page;
use elegance_core::{ReviewId, ReviewStatus};

use crate::components::{FilterOption, Pagination};
use crate::db::{RepositoryError, ReviewRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::ReviewRow;
use crate::routes::PER_PAGE;
use crate::state::AppState;
use crate::views::{Layout, redirect_with_error, redirect_with_success, short_date};

/// A review awaiting or past moderation.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub id: i32,
    pub product_name: String,
    pub product_url: Option<String>,
    pub reviewer: String,
    pub email: String,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub status: ReviewStatus,
    pub date: String,
}

impl ReviewView {
    fn new(row: &ReviewRow, product_url: Option<String>) -> Self {
        Self {
            id: row.id.as_i32(),
            product_name: row.product_name.clone(),
            product_url,
            reviewer: row.reviewer_name.clone(),
            email: row.reviewer_email.clone(),
            rating: row.rating,
            title: row.title.clone(),
            comment: row.comment.clone(),
            status: row.status,
            date: short_date(row.created_at),
        }
    }
}

/// Review list query. The queue defaults to pending reviews; `all` lists every status.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReviewsQuery {
    pub status: String,
    pub page: Option<u32>,
}

impl Default for ReviewsQuery {
    fn default() -> Self {
        Self {
            status: ReviewStatus::Pending.as_str().to_owned(),
            page: None,
        }
    }
}

/// Review moderation template.
#[derive(Template, WebTemplate)]
#[template(path = "reviews/index.html")]
pub struct ReviewsTemplate {
    pub layout: Layout,
    pub reviews: Vec<ReviewView>,
    pub statuses: Vec<FilterOption>,
    pub pagination: Pagination,
}

/// Build the reviews router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(index))
        .route("/reviews/{id}/approve", post(approve))
        .route("/reviews/{id}/reject", post(reject))
        .route("/reviews/{id}/delete", post(delete))
}

/// Reviews in one status, newest first.
///
/// GET /reviews
#[instrument(skip(state, layout, admin, query), fields(admin_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Query(query): Query<ReviewsQuery>,
) -> Result<ReviewsTemplate> {
    let page = Page::new(query.page, PER_PAGE);
    let status = query.status.parse::<ReviewStatus>().ok();
    let (rows, total) = ReviewRepository::new(state.pool())
        .list(status, page)
        .await?;

    let config = state.config();
    let selected = status.map_or("all", ReviewStatus::as_str);
    let mut statuses = vec![FilterOption::new("all", "All reviews", selected)];
    statuses.extend(FilterOption::list(ReviewStatus::ALL, selected, |s| (s.as_str(), s.label())));

    Ok(ReviewsTemplate {
        layout,
        reviews: rows
            .iter()
            .map(|row| ReviewView::new(row, config.storefront_product_url(&row.product_slug)))
            .collect(),
        statuses,
        pagination: Pagination::new(page.info(total), "/reviews", &[("status", selected)]),
    })
}

/// Publish a review on the product page.
///
/// POST /reviews/{id}/approve
async fn approve(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ReviewId>,
) -> Result<Redirect> {
    moderate(&state, id, ReviewStatus::Approved).await
}

/// Hide a review.
///
/// POST /reviews/{id}/reject
async fn reject(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ReviewId>,
) -> Result<Redirect> {
    moderate(&state, id, ReviewStatus::Rejected).await
}

#[instrument(skip(state))]
async fn moderate(state: &AppState, id: ReviewId, status: ReviewStatus) -> Result<Redirect> {
    match ReviewRepository::new(state.pool()).set_status(id, status).await {
        Ok(()) => {
            tracing::info!(review_id = %id, status = %status, "Review moderated");
            Ok(redirect_with_success(
                "/reviews",
                &format!("Review {}", status.label().to_lowercase()),
            ))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_with_error("/reviews", "Review not found")),
        Err(e) => Err(e.into()),
    }
}

/// Remove a review permanently.
///
/// POST /reviews/{id}/delete
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ReviewId>,
) -> Result<Redirect> {
    match ReviewRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            tracing::info!(review_id = %id, "Review deleted");
            Ok(redirect_with_success("/reviews", "Review deleted"))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_with_error("/reviews", "Review not found")),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_defaults_to_pending() {
        let query = ReviewsQuery::default();
        assert_eq!(query.status.parse::<ReviewStatus>().ok(), Some(ReviewStatus::Pending));
        assert!("all".parse::<ReviewStatus>().is_err());
    }
}
