//! Cart operations for guests and signed-in customers.
//!
//! Signed-in customers' carts live in `cart_items`; guests keep a
//! [`GuestCart`] in their session. Both follow the same line rules from
//! `elegance_core::cart`. When a guest signs in their session cart is folded
//! into the persistent one.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;
use uuid::Uuid;

use elegance_core::cart::{
    CartError, CartLine, GuestCart, GuestLine, MAX_CART_ITEMS, clamp_quantity, validate_options,
};
use elegance_core::catalog::Product;
use elegance_core::{CartItemId, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{CurrentUser, keys};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// The request broke a cart rule.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// No line with that key in this cart.
    #[error("cart line not found")]
    LineNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Whose cart an operation acts on.
#[derive(Debug, Clone, Copy)]
pub enum CartOwner {
    Guest,
    User(UserId),
}

impl CartOwner {
    /// The signed-in user's cart, or the session cart for guests.
    #[must_use]
    pub fn of(user: Option<&CurrentUser>) -> Self {
        user.map_or(Self::Guest, |u| Self::User(u.id))
    }
}

/// Cart service bound to one request's session.
pub struct CartService<'a> {
    pool: &'a PgPool,
    session: &'a Session,
    owner: CartOwner,
}

impl<'a> CartService<'a> {
    /// Create a cart service for the given owner.
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session, owner: CartOwner) -> Self {
        Self {
            pool,
            session,
            owner,
        }
    }

    /// Cart lines with their products, oldest first.
    ///
    /// Guest lines whose product has been deleted are dropped.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError` if the database or session fails.
    pub async fn lines(&self) -> Result<Vec<CartLine>, CartServiceError> {
        match self.owner {
            CartOwner::User(user_id) => Ok(CartRepository::new(self.pool).lines(user_id).await?),
            CartOwner::Guest => {
                let mut cart = load_guest_cart(self.session).await?;
                if cart.is_empty() {
                    return Ok(Vec::new());
                }

                let products = ProductRepository::new(self.pool)
                    .get_many(&cart.product_ids())
                    .await?;
                let known: Vec<_> = products.iter().map(|p| p.id).collect();
                let before = cart.lines().len();
                cart.retain_products(&known);
                if cart.lines().len() != before {
                    save_guest_cart(self.session, &cart).await?;
                }

                Ok(cart
                    .lines()
                    .iter()
                    .filter_map(|line| {
                        let product = products.iter().find(|p| p.id == line.product_id)?;
                        Some(CartLine {
                            key: line.id.to_string(),
                            product: product.clone(),
                            quantity: line.quantity,
                            size: line.size.clone(),
                            color: line.color.clone(),
                        })
                    })
                    .collect())
            }
        }
    }

    /// Total units, for the header badge.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError` if the database or session fails.
    pub async fn count(&self) -> Result<u32, CartServiceError> {
        match self.owner {
            CartOwner::User(user_id) => {
                let count = CartRepository::new(self.pool).item_count(user_id).await?;
                Ok(u32::try_from(count).unwrap_or(u32::MAX))
            }
            CartOwner::Guest => Ok(load_guest_cart(self.session).await?.count()),
        }
    }

    /// Add a product with the chosen options.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Cart` if the product can't be bought with
    /// these options or the cart is full.
    pub async fn add(
        &self,
        product: &Product,
        quantity: i64,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<(), CartServiceError> {
        let (size, color) = validate_options(product, size, color)?;
        let quantity = clamp_quantity(quantity).unwrap_or(1);

        match self.owner {
            CartOwner::User(user_id) => {
                let repo = CartRepository::new(self.pool);
                let existing = repo
                    .has_line(user_id, product.id, size.as_deref(), color.as_deref())
                    .await?;
                if !existing {
                    let lines = repo.line_count(user_id).await?;
                    if usize::try_from(lines).unwrap_or(usize::MAX) >= MAX_CART_ITEMS {
                        return Err(CartError::TooManyItems {
                            max: MAX_CART_ITEMS,
                        }
                        .into());
                    }
                }
                repo.add(user_id, product.id, quantity, size.as_deref(), color.as_deref())
                    .await?;
            }
            CartOwner::Guest => {
                let mut cart = load_guest_cart(self.session).await?;
                cart.add(product.id, quantity, size, color)?;
                save_guest_cart(self.session, &cart).await?;
            }
        }

        tracing::info!(product_id = %product.id, quantity, "Added to cart");
        Ok(())
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::LineNotFound` if the key isn't in this cart.
    pub async fn update(&self, key: &str, quantity: i64) -> Result<(), CartServiceError> {
        match self.owner {
            CartOwner::User(user_id) => {
                let item_id: CartItemId = key.parse().map_err(|_| CartServiceError::LineNotFound)?;
                let repo = CartRepository::new(self.pool);
                let found = match clamp_quantity(quantity) {
                    Some(q) => repo.set_quantity(user_id, item_id, q).await?,
                    None => repo.remove(user_id, item_id).await?,
                };
                if !found {
                    return Err(CartServiceError::LineNotFound);
                }
            }
            CartOwner::Guest => {
                let id: Uuid = key.parse().map_err(|_| CartServiceError::LineNotFound)?;
                let mut cart = load_guest_cart(self.session).await?;
                if !cart.set_quantity(id, quantity) {
                    return Err(CartServiceError::LineNotFound);
                }
                save_guest_cart(self.session, &cart).await?;
            }
        }
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::LineNotFound` if the key isn't in this cart.
    pub async fn remove(&self, key: &str) -> Result<(), CartServiceError> {
        self.update(key, 0).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError` if the database or session fails.
    pub async fn clear(&self) -> Result<(), CartServiceError> {
        match self.owner {
            CartOwner::User(user_id) => CartRepository::new(self.pool).clear(user_id).await?,
            CartOwner::Guest => {
                self.session.remove::<GuestCart>(keys::GUEST_CART).await?;
            }
        }
        Ok(())
    }
}

/// Fold the session's guest cart into a user's persistent cart.
///
/// Lines for products that were deleted or taken off sale are skipped, as
/// are lines beyond the cart limit. A line that fails to save is logged and
/// the rest are still merged. The guest cart is removed from the session
/// once its products have been loaded.
///
/// # Errors
///
/// Returns `CartServiceError` if the products can't be loaded or the session
/// fails. The guest cart is left in the session in that case.
pub async fn merge_guest_cart(
    pool: &PgPool,
    session: &Session,
    user_id: UserId,
) -> Result<(), CartServiceError> {
    let Some(guest) = session.get::<GuestCart>(keys::GUEST_CART).await? else {
        return Ok(());
    };

    let products = ProductRepository::new(pool)
        .get_many(&guest.product_ids())
        .await?;
    session.remove::<GuestCart>(keys::GUEST_CART).await?;

    let lines = guest.mergeable_lines(&products);
    let skipped = guest.lines().len() - lines.len();
    let repo = CartRepository::new(pool);
    let mut merged = 0_usize;
    for line in lines {
        match merge_line(&repo, user_id, line).await {
            Ok(true) => merged += 1,
            Ok(false) => break,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    product_id = %line.product_id,
                    error = %e,
                    "Failed to merge guest cart line"
                );
            }
        }
    }

    if merged > 0 || skipped > 0 {
        tracing::info!(user_id = %user_id, lines = merged, skipped, "Merged guest cart");
    }
    Ok(())
}

/// Add one guest line to the user's cart. `Ok(false)` when the cart is full.
async fn merge_line(
    repo: &CartRepository<'_>,
    user_id: UserId,
    line: &GuestLine,
) -> Result<bool, RepositoryError> {
    let exists = repo
        .has_line(user_id, line.product_id, line.size.as_deref(), line.color.as_deref())
        .await?;
    if !exists {
        let count = repo.line_count(user_id).await?;
        if usize::try_from(count).unwrap_or(usize::MAX) >= MAX_CART_ITEMS {
            return Ok(false);
        }
    }
    repo.add(
        user_id,
        line.product_id,
        line.quantity,
        line.size.as_deref(),
        line.color.as_deref(),
    )
    .await?;
    Ok(true)
}

async fn load_guest_cart(session: &Session) -> Result<GuestCart, CartServiceError> {
    Ok(session
        .get::<GuestCart>(keys::GUEST_CART)
        .await?
        .unwrap_or_default())
}

async fn save_guest_cart(session: &Session, cart: &GuestCart) -> Result<(), CartServiceError> {
    if cart.is_empty() {
        session.remove::<GuestCart>(keys::GUEST_CART).await?;
    } else {
        session.insert(keys::GUEST_CART, cart).await?;
    }
    Ok(())
}
