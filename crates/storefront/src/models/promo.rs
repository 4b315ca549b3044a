//! Promotional discount codes.

use rust_decimal::Decimal;
use serde::Serialize;

use elegance_core::pricing::PromoRule;
use elegance_core::{PromoCodeId, PromoKind};

/// A promo code row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PromoCode {
    pub id: PromoCodeId,
    pub code: String,
    pub kind: PromoKind,
    pub value: Decimal,
    pub description: String,
    pub is_active: bool,
}

impl PromoCode {
    #[must_use]
    pub fn rule(&self) -> PromoRule {
        PromoRule::from_parts(self.kind, self.value)
    }
}
