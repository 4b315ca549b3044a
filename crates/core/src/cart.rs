//! Cart line rules.
//!
//! A cart holds lines keyed by `(product, size, color)`. Adding an item that
//! matches an existing line bumps that line's quantity instead of adding a
//! new one. Per-line quantity stays within `1..=MAX_LINE_QUANTITY`; setting
//! a quantity of zero or less removes the line.
//!
//! Signed-in carts live in `cart_items`; the storefront applies the same
//! rules there with an upsert. Guests get a [`GuestCart`] serialized into
//! their session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Product;
use crate::pricing::{self, OrderTotals, PricedLine, PricingConfig};
use crate::types::{Money, ProductId, ShippingMethod};

/// Most units of one line a cart may hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Most distinct lines a cart may hold.
pub const MAX_CART_ITEMS: usize = 50;

/// Errors from cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("your cart is full ({max} items maximum)")]
    TooManyItems { max: usize },
    #[error("please select a size")]
    SizeRequired,
    #[error("please select a color")]
    ColorRequired,
    #[error("size {0} is not available for this product")]
    InvalidSize(String),
    #[error("color {0} is not available for this product")]
    InvalidColor(String),
    #[error("this product is out of stock")]
    OutOfStock,
    #[error("this product is no longer available")]
    Unavailable,
}

/// Clamp a requested quantity.
///
/// Returns `None` when the quantity means "remove".
#[must_use]
pub fn clamp_quantity(requested: i64) -> Option<u32> {
    if requested <= 0 {
        None
    } else {
        Some(u32::try_from(requested).map_or(MAX_LINE_QUANTITY, |q| q.min(MAX_LINE_QUANTITY)))
    }
}

/// Check the chosen size and color against what the product offers.
///
/// Products without sizes (or colors) accept none; blank selections count as
/// none.
///
/// # Errors
///
/// Returns a [`CartError`] naming the first missing or invalid option.
pub fn validate_options(
    product: &Product,
    size: Option<&str>,
    color: Option<&str>,
) -> Result<(Option<String>, Option<String>), CartError> {
    if !product.is_active {
        return Err(CartError::Unavailable);
    }
    if !product.in_stock() {
        return Err(CartError::OutOfStock);
    }

    let size = pick_option(&product.sizes, size, CartError::SizeRequired, CartError::InvalidSize)?;
    let color = pick_option(&product.colors, color, CartError::ColorRequired, CartError::InvalidColor)?;
    Ok((size, color))
}

fn pick_option(
    offered: &[String],
    chosen: Option<&str>,
    missing: CartError,
    invalid: fn(String) -> CartError,
) -> Result<Option<String>, CartError> {
    let chosen = chosen.map(str::trim).filter(|s| !s.is_empty());
    match chosen {
        None if offered.is_empty() => Ok(None),
        None => Err(missing),
        Some(value) if offered.iter().any(|o| o == value) => Ok(Some(value.to_owned())),
        Some(value) => Err(invalid(value.to_owned())),
    }
}

/// One line of a guest cart, as stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestLine {
    pub id: Uuid,
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl GuestLine {
    fn same_item(&self, product_id: ProductId, size: Option<&str>, color: Option<&str>) -> bool {
        self.product_id == product_id && self.size.as_deref() == size && self.color.as_deref() == color
    }
}

/// The cart of a visitor who is not signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCart {
    lines: Vec<GuestLine>,
}

impl GuestCart {
    #[must_use]
    pub fn lines(&self) -> &[GuestLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units in the cart.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Add units of an item, merging with a matching line.
    ///
    /// Returns the id of the line that now holds the item.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TooManyItems`] if a new line would exceed
    /// [`MAX_CART_ITEMS`].
    pub fn add(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<Uuid, CartError> {
        let quantity = quantity.clamp(1, MAX_LINE_QUANTITY);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.same_item(product_id, size.as_deref(), color.as_deref()))
        {
            line.quantity = (line.quantity + quantity).min(MAX_LINE_QUANTITY);
            return Ok(line.id);
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CartError::TooManyItems {
                max: MAX_CART_ITEMS,
            });
        }

        let id = Uuid::new_v4();
        self.lines.push(GuestLine {
            id,
            product_id,
            quantity,
            size,
            color,
        });
        Ok(id)
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// Returns `false` if no line has that id.
    pub fn set_quantity(&mut self, id: Uuid, requested: i64) -> bool {
        match clamp_quantity(requested) {
            None => self.remove(id),
            Some(quantity) => self
                .lines
                .iter_mut()
                .find(|l| l.id == id)
                .map(|line| line.quantity = quantity)
                .is_some(),
        }
    }

    /// Remove a line. Returns `false` if no line has that id.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        self.lines.len() != before
    }

    /// Drop lines whose product no longer exists.
    pub fn retain_products(&mut self, known: &[ProductId]) {
        self.lines.retain(|l| known.contains(&l.product_id));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines whose product is among `products` and still on sale.
    #[must_use]
    pub fn mergeable_lines(&self, products: &[Product]) -> Vec<&GuestLine> {
        self.lines
            .iter()
            .filter(|l| {
                products
                    .iter()
                    .any(|p| p.id == l.product_id && p.is_active)
            })
            .collect()
    }

    /// Distinct product ids, for loading product rows.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.lines.iter().map(|l| l.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// A cart line joined with its product, ready to price and render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Form key for update/remove: a `cart_items` id or a guest line uuid.
    pub key: String,
    pub product: Product,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartLine {
    #[must_use]
    pub fn priced(&self) -> PricedLine {
        PricedLine::new(self.product.price, self.product.sale_price, self.quantity)
    }

    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.priced().unit_price()
    }

    #[must_use]
    pub fn line_total(&self) -> Money {
        self.priced().line_total()
    }

    /// Whether the product still has enough stock for this line.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.product.is_active
            && i64::from(self.product.stock_quantity) >= i64::from(self.quantity)
    }
}

/// Cart page totals: standard shipping, no promo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub totals: OrderTotals,
    /// Extra spend needed for free shipping, if any.
    pub until_free_shipping: Option<Money>,
}

impl CartSummary {
    #[must_use]
    pub fn new(lines: &[CartLine], config: &PricingConfig) -> Self {
        let priced: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();
        let totals = pricing::compute_totals(&priced, ShippingMethod::Standard, None, config);
        let until_free_shipping = if lines.is_empty() {
            None
        } else {
            pricing::amount_until_free_shipping(totals.subtotal, config)
        };
        Self {
            totals,
            until_free_shipping,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(sizes: &[&str], colors: &[&str]) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: None,
            name: "Classic Black Abaya".to_owned(),
            slug: "classic-black-abaya".to_owned(),
            description: None,
            sku: None,
            price: Money::from_cents(12_000),
            sale_price: Some(Money::from_cents(9_000)),
            stock_quantity: 4,
            images: vec![],
            sizes: sizes.iter().map(|s| (*s).to_owned()).collect(),
            colors: colors.iter().map(|s| (*s).to_owned()).collect(),
            is_active: true,
            is_featured: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_mergeable_lines_skip_deleted_and_inactive_products() {
        let mut cart = GuestCart::default();
        cart.add(ProductId::new(1), 1, None, None).unwrap();
        cart.add(ProductId::new(7), 2, None, None).unwrap();
        cart.add(ProductId::new(3), 1, None, None).unwrap();

        let live = product(&[], &[]);
        let mut hidden = product(&[], &[]);
        hidden.id = ProductId::new(3);
        hidden.is_active = false;

        let products = [live, hidden];
        let lines = cart.mergeable_lines(&products);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().map(|l| l.product_id), Some(ProductId::new(1)));
        assert!(cart.mergeable_lines(&[]).is_empty());
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0), None);
        assert_eq!(clamp_quantity(-3), None);
        assert_eq!(clamp_quantity(4), Some(4));
        assert_eq!(clamp_quantity(11), Some(10));
        assert_eq!(clamp_quantity(i64::MAX), Some(10));
    }

    #[test]
    fn test_add_merges_matching_lines() {
        let mut cart = GuestCart::default();
        let p = ProductId::new(1);
        let first = cart.add(p, 2, Some("M".into()), Some("Black".into())).unwrap();
        let second = cart.add(p, 3, Some("M".into()), Some("Black".into())).unwrap();
        assert_eq!(first, second);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.count(), 5);

        cart.add(p, 1, Some("L".into()), Some("Black".into())).unwrap();
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_add_clamps_merged_quantity() {
        let mut cart = GuestCart::default();
        let p = ProductId::new(1);
        cart.add(p, 8, None, None).unwrap();
        cart.add(p, 8, None, None).unwrap();
        assert_eq!(cart.count(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_add_rejects_beyond_max_lines() {
        let mut cart = GuestCart::default();
        for i in 0..50 {
            cart.add(ProductId::new(i), 1, None, None).unwrap();
        }
        assert_eq!(
            cart.add(ProductId::new(99), 1, None, None),
            Err(CartError::TooManyItems { max: 50 })
        );
        // Merging into an existing line still works when full
        assert!(cart.add(ProductId::new(0), 1, None, None).is_ok());
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = GuestCart::default();
        let id = cart.add(ProductId::new(1), 1, None, None).unwrap();

        assert!(cart.set_quantity(id, 12));
        assert_eq!(cart.count(), 10);

        assert!(cart.set_quantity(id, 0));
        assert!(cart.is_empty());
        assert!(!cart.remove(id));
        assert!(!cart.set_quantity(Uuid::new_v4(), 2));
    }

    #[test]
    fn test_validate_options() {
        let p = product(&["S", "M"], &["Black"]);
        assert_eq!(
            validate_options(&p, Some("M"), Some("Black")),
            Ok((Some("M".to_owned()), Some("Black".to_owned())))
        );
        assert_eq!(validate_options(&p, None, Some("Black")), Err(CartError::SizeRequired));
        assert_eq!(validate_options(&p, Some(" "), Some("Black")), Err(CartError::SizeRequired));
        assert_eq!(
            validate_options(&p, Some("XXL"), Some("Black")),
            Err(CartError::InvalidSize("XXL".to_owned()))
        );
        assert_eq!(validate_options(&p, Some("S"), None), Err(CartError::ColorRequired));

        let plain = product(&[], &[]);
        assert_eq!(validate_options(&plain, None, None), Ok((None, None)));

        let mut sold_out = product(&[], &[]);
        sold_out.stock_quantity = 0;
        assert_eq!(validate_options(&sold_out, None, None), Err(CartError::OutOfStock));
    }

    #[test]
    fn test_summary_prices_with_sale_price() {
        let config = PricingConfig::default();
        let lines = vec![CartLine {
            key: "1".to_owned(),
            product: product(&[], &[]),
            quantity: 2,
            size: None,
            color: None,
        }];
        let summary = CartSummary::new(&lines, &config);
        assert_eq!(summary.totals.subtotal, Money::from_cents(18_000));
        assert_eq!(summary.totals.shipping, Money::from_cents(1_500));
        assert_eq!(summary.until_free_shipping, Some(Money::from_cents(2_000)));
        assert!(lines.first().unwrap().is_available());
    }

    #[test]
    fn test_summary_empty_cart() {
        let summary = CartSummary::new(&[], &PricingConfig::default());
        assert_eq!(summary.totals.item_count, 0);
        assert_eq!(summary.until_free_shipping, None);
    }
}
