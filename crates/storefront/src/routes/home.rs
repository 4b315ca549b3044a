//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use elegance_core::catalog::Category;

use crate::db::{ProductRepository, WishlistRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::views::{Layout, ProductCard};

/// Categories promoted in the hero section.
const FEATURED_CATEGORIES: usize = 2;
const NEW_ARRIVALS: i64 = 8;
const FEATURED_PRODUCTS: i64 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub featured_categories: Vec<Category>,
    pub new_arrivals: Vec<ProductCard>,
    pub featured: Vec<ProductCard>,
}

/// Display the home page.
#[instrument(skip(state, layout, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    layout: Layout,
) -> Result<HomeTemplate> {
    let products = ProductRepository::new(state.pool());
    let wishlist = WishlistRepository::new(state.pool());

    let (categories, newest, featured, wishlisted) = tokio::try_join!(
        state.categories(),
        products.newest(NEW_ARRIVALS),
        products.featured(FEATURED_PRODUCTS),
        async {
            match &user {
                Some(user) => wishlist.product_ids(user.id).await,
                None => Ok(Vec::new()),
            }
        },
    )?;

    Ok(HomeTemplate {
        layout,
        featured_categories: categories.iter().take(FEATURED_CATEGORIES).cloned().collect(),
        new_arrivals: ProductCard::list(&newest, &wishlisted),
        featured: ProductCard::list(&featured, &wishlisted),
    })
}
