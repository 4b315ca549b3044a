//! Cart and order price computation.
//!
//! Every amount a customer sees is produced here:
//!
//! ```text
//! subtotal = Σ effective_unit_price × quantity
//! shipping = 0 if subtotal ≥ free_shipping_threshold else shipping_cost   (standard)
//! discount = min(promo(subtotal), subtotal)
//! tax      = tax_rate × (subtotal − discount)
//! total    = subtotal + shipping − discount + tax
//! ```
//!
//! Express and overnight shipping are flat rates that ignore the threshold.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{Money, PromoKind, ShippingMethod};

/// Store-wide pricing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat standard shipping charge below the threshold.
    pub shipping_cost: Money,
    /// Subtotal at or above which standard shipping is free.
    pub free_shipping_threshold: Money,
    /// Sales tax as a fraction (`0.08` for 8%).
    pub tax_rate: Decimal,
    pub express_rate: Money,
    pub overnight_rate: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            shipping_cost: Money::from_cents(1_500),
            free_shipping_threshold: Money::from_cents(20_000),
            tax_rate: Decimal::new(8, 2),
            express_rate: Money::from_cents(999),
            overnight_rate: Money::from_cents(2_499),
        }
    }
}

/// One cart or order line, reduced to what pricing needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub price: Money,
    pub sale_price: Option<Money>,
    pub quantity: u32,
}

impl PricedLine {
    #[must_use]
    pub const fn new(price: Money, sale_price: Option<Money>, quantity: u32) -> Self {
        Self {
            price,
            sale_price,
            quantity,
        }
    }

    /// The price actually charged per unit.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        effective_unit_price(self.price, self.sale_price)
    }

    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price().times(self.quantity)
    }
}

/// A promo code's discount rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PromoRule {
    /// Percent off the subtotal (`10` for 10%).
    Percentage(Decimal),
    /// Fixed dollar amount off.
    Fixed(Money),
}

impl PromoRule {
    /// Build a rule from its stored kind and value.
    #[must_use]
    pub fn from_parts(kind: PromoKind, value: Decimal) -> Self {
        match kind {
            PromoKind::Percentage => Self::Percentage(value),
            PromoKind::Fixed => Self::Fixed(Money::new(value)),
        }
    }

    /// Discount this rule grants on `subtotal`, capped at the subtotal.
    #[must_use]
    pub fn discount(&self, subtotal: Money) -> Money {
        let raw = match *self {
            Self::Percentage(percent) => subtotal * (percent / Decimal::ONE_HUNDRED),
            Self::Fixed(amount) => amount,
        };
        raw.round().non_negative().min(subtotal.non_negative())
    }

    /// Short description for the order summary (`10% off`, `$20.00 off`).
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Percentage(percent) => format!("{}% off", percent.normalize()),
            Self::Fixed(amount) => format!("{amount} off"),
        }
    }
}

/// Normalize user-entered promo code text (trimmed, upper-case).
#[must_use]
pub fn normalize_promo_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Sale price when it is present and lower than the list price.
#[must_use]
pub fn effective_unit_price(price: Money, sale_price: Option<Money>) -> Money {
    match sale_price {
        Some(sale) if sale < price => sale,
        _ => price,
    }
}

/// Sum of line totals.
#[must_use]
pub fn subtotal(lines: &[PricedLine]) -> Money {
    lines.iter().map(PricedLine::line_total).sum()
}

/// Shipping charge for a subtotal and delivery method.
#[must_use]
pub fn shipping_cost(subtotal: Money, method: ShippingMethod, config: &PricingConfig) -> Money {
    match method {
        ShippingMethod::Standard if subtotal >= config.free_shipping_threshold => Money::ZERO,
        ShippingMethod::Standard => config.shipping_cost,
        ShippingMethod::Express => config.express_rate,
        ShippingMethod::Overnight => config.overnight_rate,
    }
}

/// Tax on the discounted subtotal, rounded to cents.
#[must_use]
pub fn tax(taxable: Money, config: &PricingConfig) -> Money {
    (taxable.non_negative() * config.tax_rate).round()
}

/// How much more the customer must spend for free standard shipping.
///
/// `None` once the threshold is reached.
#[must_use]
pub fn amount_until_free_shipping(subtotal: Money, config: &PricingConfig) -> Option<Money> {
    (subtotal < config.free_shipping_threshold).then(|| config.free_shipping_threshold - subtotal)
}

/// Whole-percent saving shown on sale badges, e.g. `Some(25)` for 25% off.
#[must_use]
pub fn discount_percent(price: Money, sale_price: Option<Money>) -> Option<u32> {
    let sale = sale_price.filter(|s| *s < price)?;
    if price.amount() <= Decimal::ZERO {
        return None;
    }
    ((price - sale).amount() / price.amount() * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
}

/// A fully priced cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Number of units across all lines.
    pub item_count: u32,
    pub subtotal: Money,
    pub shipping: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderTotals {
    #[must_use]
    pub fn is_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}

/// Price a set of lines.
#[must_use]
pub fn compute_totals(
    lines: &[PricedLine],
    method: ShippingMethod,
    promo: Option<&PromoRule>,
    config: &PricingConfig,
) -> OrderTotals {
    let subtotal = subtotal(lines);
    let shipping = shipping_cost(subtotal, method, config);
    let discount = promo.map_or(Money::ZERO, |rule| rule.discount(subtotal));
    let tax = tax(subtotal - discount, config);

    OrderTotals {
        item_count: lines.iter().map(|l| l.quantity).sum(),
        subtotal,
        shipping,
        discount,
        tax,
        total: subtotal + shipping - discount + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dollars(d: i64) -> Money {
        Money::from_cents(d * 100)
    }

    fn line(price: i64, sale: Option<i64>, quantity: u32) -> PricedLine {
        PricedLine::new(dollars(price), sale.map(dollars), quantity)
    }

    #[test]
    fn test_effective_price_uses_lower_sale_price() {
        assert_eq!(effective_unit_price(dollars(100), Some(dollars(80))), dollars(80));
        assert_eq!(effective_unit_price(dollars(100), Some(dollars(120))), dollars(100));
        assert_eq!(effective_unit_price(dollars(100), Some(dollars(100))), dollars(100));
        assert_eq!(effective_unit_price(dollars(100), None), dollars(100));
    }

    #[test]
    fn test_subtotal_multiplies_quantity() {
        let lines = [line(50, None, 2), line(100, Some(75), 1)];
        assert_eq!(subtotal(&lines), dollars(175));
    }

    #[test]
    fn test_free_shipping_boundary_is_inclusive() {
        let config = PricingConfig::default();
        let below = Money::from_cents(19_999);
        assert_eq!(shipping_cost(below, ShippingMethod::Standard, &config), dollars(15));
        assert_eq!(shipping_cost(dollars(200), ShippingMethod::Standard, &config), Money::ZERO);
        assert_eq!(shipping_cost(dollars(201), ShippingMethod::Standard, &config), Money::ZERO);
    }

    #[test]
    fn test_expedited_shipping_ignores_threshold() {
        let config = PricingConfig::default();
        assert_eq!(
            shipping_cost(dollars(500), ShippingMethod::Express, &config),
            Money::from_cents(999)
        );
        assert_eq!(
            shipping_cost(dollars(10), ShippingMethod::Overnight, &config),
            Money::from_cents(2_499)
        );
    }

    #[test]
    fn test_percentage_discount() {
        let rule = PromoRule::Percentage(Decimal::from(10));
        assert_eq!(rule.discount(dollars(150)), dollars(15));
        assert_eq!(rule.discount(Money::from_cents(3_333)), Money::from_cents(333));
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let rule = PromoRule::Fixed(dollars(20));
        assert_eq!(rule.discount(dollars(50)), dollars(20));
        assert_eq!(rule.discount(dollars(12)), dollars(12));
        assert_eq!(rule.discount(Money::ZERO), Money::ZERO);
    }

    #[test]
    fn test_percentage_over_hundred_capped() {
        let rule = PromoRule::Percentage(Decimal::from(150));
        assert_eq!(rule.discount(dollars(40)), dollars(40));
    }

    #[test]
    fn test_tax_applies_to_discounted_subtotal() {
        let config = PricingConfig::default();
        assert_eq!(tax(dollars(100) - dollars(20), &config), Money::from_cents(640));
        assert_eq!(tax(Money::from_cents(1_006), &config), Money::from_cents(80));
    }

    #[test]
    fn test_compute_totals_without_promo() {
        let config = PricingConfig::default();
        let lines = [line(60, None, 2)];
        let totals = compute_totals(&lines, ShippingMethod::Standard, None, &config);

        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.subtotal, dollars(120));
        assert_eq!(totals.shipping, dollars(15));
        assert_eq!(totals.discount, Money::ZERO);
        assert_eq!(totals.tax, Money::from_cents(960));
        assert_eq!(totals.total, Money::from_cents(14_460));
    }

    #[test]
    fn test_compute_totals_with_promo_and_free_shipping() {
        let config = PricingConfig::default();
        let lines = [line(150, Some(125), 2)];
        let promo = PromoRule::Percentage(Decimal::from(10));
        let totals = compute_totals(&lines, ShippingMethod::Standard, Some(&promo), &config);

        // 250 subtotal, free shipping, 25 off, 8% of 225
        assert_eq!(totals.subtotal, dollars(250));
        assert_eq!(totals.shipping, Money::ZERO);
        assert!(totals.is_free_shipping());
        assert_eq!(totals.discount, dollars(25));
        assert_eq!(totals.tax, dollars(18));
        assert_eq!(totals.total, dollars(243));
    }

    #[test]
    fn test_compute_totals_fixed_promo_exceeding_subtotal() {
        let config = PricingConfig::default();
        let lines = [line(15, None, 1)];
        let promo = PromoRule::Fixed(dollars(20));
        let totals = compute_totals(&lines, ShippingMethod::Express, Some(&promo), &config);

        assert_eq!(totals.discount, dollars(15));
        assert_eq!(totals.tax, Money::ZERO);
        assert_eq!(totals.total, Money::from_cents(999));
    }

    #[test]
    fn test_threshold_uses_pre_discount_subtotal() {
        let config = PricingConfig::default();
        let lines = [line(200, None, 1)];
        let promo = PromoRule::Fixed(dollars(20));
        let totals = compute_totals(&lines, ShippingMethod::Standard, Some(&promo), &config);
        assert_eq!(totals.shipping, Money::ZERO);
    }

    #[test]
    fn test_amount_until_free_shipping() {
        let config = PricingConfig::default();
        assert_eq!(amount_until_free_shipping(dollars(150), &config), Some(dollars(50)));
        assert_eq!(amount_until_free_shipping(dollars(200), &config), None);
    }

    #[test]
    fn test_discount_percent_rounds() {
        assert_eq!(discount_percent(dollars(120), Some(dollars(90))), Some(25));
        assert_eq!(discount_percent(dollars(3), Some(dollars(2))), Some(33));
        assert_eq!(discount_percent(dollars(8), Some(dollars(7))), Some(13));
        assert_eq!(discount_percent(dollars(100), None), None);
        assert_eq!(discount_percent(dollars(100), Some(dollars(100))), None);
    }

    #[test]
    fn test_promo_helpers() {
        assert_eq!(normalize_promo_code("  welcome10 "), "WELCOME10");
        assert_eq!(
            PromoRule::from_parts(PromoKind::Fixed, Decimal::from(20)),
            PromoRule::Fixed(dollars(20))
        );
        assert_eq!(PromoRule::Percentage(Decimal::new(1500, 2)).describe(), "15% off");
        assert_eq!(PromoRule::Fixed(dollars(20)).describe(), "$20.00 off");
    }
}
