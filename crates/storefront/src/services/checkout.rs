//! Order placement.
//!
//! Prices are always recomputed from current product rows at submission
//! time; nothing the browser sends about prices is trusted.

use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use elegance_core::OrderId;
use elegance_core::cart::CartLine;
use elegance_core::checkout::{CheckoutForm, FieldError};
use elegance_core::pricing::{OrderTotals, PricingConfig, PromoRule, compute_totals};

use super::cart::{CartOwner, CartService, CartServiceError};
use crate::db::{NewOrder, OrderRepository, PromoCodeRepository, RepositoryError};
use crate::models::{PromoCode, keys};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    /// Form fields failed validation.
    #[error("invalid checkout form")]
    Invalid(Vec<FieldError>),

    /// A line's product is inactive or short on stock.
    #[error("{0} is no longer available in the requested quantity")]
    Unavailable(String),

    #[error(transparent)]
    Cart(#[from] CartServiceError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Cart lines, the applied promo, and the resulting totals.
#[derive(Debug)]
pub struct CheckoutQuote {
    pub lines: Vec<CartLine>,
    pub promo: Option<PromoCode>,
    pub totals: OrderTotals,
}

/// Checkout service bound to one request's session.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    session: &'a Session,
    owner: CartOwner,
    pricing: &'a PricingConfig,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        session: &'a Session,
        owner: CartOwner,
        pricing: &'a PricingConfig,
    ) -> Self {
        Self {
            pool,
            session,
            owner,
            pricing,
        }
    }

    /// The promo code stored in the session, if still active.
    ///
    /// A code that has since been deactivated is dropped from the session.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the database or session fails.
    pub async fn applied_promo(&self) -> Result<Option<PromoCode>, CheckoutError> {
        let Some(code) = self.session.get::<String>(keys::PROMO_CODE).await? else {
            return Ok(None);
        };
        let promo = PromoCodeRepository::new(self.pool).get_active(&code).await?;
        if promo.is_none() {
            self.session.remove::<String>(keys::PROMO_CODE).await?;
        }
        Ok(promo)
    }

    /// Validate and remember a promo code. Returns `None` for unknown codes.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the database or session fails.
    pub async fn apply_promo(&self, input: &str) -> Result<Option<PromoCode>, CheckoutError> {
        let code = elegance_core::pricing::normalize_promo_code(input);
        if code.is_empty() {
            return Ok(None);
        }
        let promo = PromoCodeRepository::new(self.pool).get_active(&code).await?;
        if let Some(promo) = &promo {
            self.session.insert(keys::PROMO_CODE, &promo.code).await?;
        }
        Ok(promo)
    }

    /// Forget the applied promo code.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Session` if the session store fails.
    pub async fn remove_promo(&self) -> Result<(), CheckoutError> {
        self.session.remove::<String>(keys::PROMO_CODE).await?;
        Ok(())
    }

    /// Price the current cart for the given shipping method.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the database or session fails.
    pub async fn quote(
        &self,
        method: elegance_core::ShippingMethod,
    ) -> Result<CheckoutQuote, CheckoutError> {
        let cart = CartService::new(self.pool, self.session, self.owner);
        let (lines, promo) = tokio::try_join!(
            async { cart.lines().await.map_err(CheckoutError::from) },
            self.applied_promo(),
        )?;

        let totals = price_lines(&lines, method, promo.as_ref(), self.pricing);
        Ok(CheckoutQuote {
            lines,
            promo,
            totals,
        })
    }

    /// Validate the form and place the order.
    ///
    /// On success the cart and applied promo are cleared.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Invalid` with every field problem, `EmptyCart`,
    /// or `Unavailable` when stock ran out.
    pub async fn place_order(
        &self,
        form: &CheckoutForm,
        today: NaiveDate,
    ) -> Result<OrderId, CheckoutError> {
        let checkout = form.validate(today).map_err(CheckoutError::Invalid)?;
        let quote = self.quote(checkout.shipping_method).await?;

        if quote.lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(line) = quote.lines.iter().find(|l| !l.is_available()) {
            return Err(CheckoutError::Unavailable(line.product.name.clone()));
        }

        let user_id = match self.owner {
            CartOwner::User(id) => Some(id),
            CartOwner::Guest => None,
        };

        let order_id = OrderRepository::new(self.pool)
            .create(&NewOrder {
                user_id,
                checkout: &checkout,
                lines: &quote.lines,
                totals: &quote.totals,
                promo_code: quote.promo.as_ref().map(|p| p.code.as_str()),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::InsufficientStock(name) => CheckoutError::Unavailable(name),
                other => CheckoutError::Repository(other),
            })?;

        if matches!(self.owner, CartOwner::Guest) {
            CartService::new(self.pool, self.session, self.owner)
                .clear()
                .await?;
        }
        self.session.remove::<String>(keys::PROMO_CODE).await?;

        tracing::info!(
            order_id = %order_id,
            total = %quote.totals.total,
            items = quote.totals.item_count,
            "Order placed"
        );
        Ok(order_id)
    }
}

/// Totals for a set of lines.
#[must_use]
pub fn price_lines(
    lines: &[CartLine],
    method: elegance_core::ShippingMethod,
    promo: Option<&PromoCode>,
    pricing: &PricingConfig,
) -> OrderTotals {
    let priced: Vec<_> = lines.iter().map(CartLine::priced).collect();
    let rule: Option<PromoRule> = promo.map(PromoCode::rule);
    compute_totals(&priced, method, rule.as_ref(), pricing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use elegance_core::catalog::Product;
    use elegance_core::{Money, ProductId, PromoCodeId, PromoKind, ShippingMethod};
    use rust_decimal::Decimal;

    fn line(price: i64, sale: Option<i64>, quantity: u32) -> CartLine {
        CartLine {
            key: "1".to_owned(),
            product: Product {
                id: ProductId::new(1),
                category_id: None,
                name: "Abaya".to_owned(),
                slug: "abaya".to_owned(),
                description: None,
                sku: None,
                price: Money::from_cents(price),
                sale_price: sale.map(Money::from_cents),
                stock_quantity: 5,
                images: Vec::new(),
                sizes: Vec::new(),
                colors: Vec::new(),
                is_active: true,
                is_featured: false,
                created_at: Utc::now(),
            },
            quantity,
            size: None,
            color: None,
        }
    }

    #[test]
    fn test_price_lines_with_promo() {
        let promo = PromoCode {
            id: PromoCodeId::new(1),
            code: "SAVE20".to_owned(),
            kind: PromoKind::Fixed,
            value: Decimal::from(20),
            description: String::new(),
            is_active: true,
        };
        let lines = vec![line(10000, Some(8000), 1), line(5000, None, 2)];
        let totals = price_lines(
            &lines,
            ShippingMethod::Standard,
            Some(&promo),
            &PricingConfig::default(),
        );

        assert_eq!(totals.subtotal, Money::from_cents(18000));
        assert_eq!(totals.shipping, Money::from_cents(1500));
        assert_eq!(totals.discount, Money::from_cents(2000));
        // 8% of 160.00
        assert_eq!(totals.tax, Money::from_cents(1280));
        assert_eq!(totals.total, Money::from_cents(18000 + 1500 - 2000 + 1280));
    }

    #[test]
    fn test_price_lines_free_shipping_at_threshold() {
        let lines = vec![line(20000, None, 1)];
        let totals = price_lines(&lines, ShippingMethod::Standard, None, &PricingConfig::default());
        assert!(totals.is_free_shipping());
    }
}
