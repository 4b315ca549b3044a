//! Store settings edited in the admin panel.
//!
//! Stored as JSON under the `store` key of `store_settings`. The storefront
//! reads them at startup and lets them override its environment defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::PricingConfig;
use crate::types::Money;

/// Key of the settings row in `store_settings`.
pub const STORE_SETTINGS_KEY: &str = "store";

/// Editable store-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub store_name: String,
    pub contact_email: String,
    pub shipping_cost: Money,
    pub free_shipping_threshold: Money,
    /// Fraction, e.g. `0.08`.
    pub tax_rate: Decimal,
}

impl Default for StoreSettings {
    fn default() -> Self {
        let pricing = PricingConfig::default();
        Self {
            store_name: "Elegance Abayas".to_owned(),
            contact_email: String::new(),
            shipping_cost: pricing.shipping_cost,
            free_shipping_threshold: pricing.free_shipping_threshold,
            tax_rate: pricing.tax_rate,
        }
    }
}

/// Errors from [`StoreSettings::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("store name is required")]
    MissingName,
    #[error("shipping cost cannot be negative")]
    NegativeShipping,
    #[error("free shipping threshold cannot be negative")]
    NegativeThreshold,
    #[error("tax rate must be between 0 and 1")]
    TaxRateOutOfRange,
}

impl StoreSettings {
    /// Check the values an admin entered.
    ///
    /// # Errors
    ///
    /// Returns the first [`SettingsError`] found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.store_name.trim().is_empty() {
            return Err(SettingsError::MissingName);
        }
        if self.shipping_cost < Money::ZERO {
            return Err(SettingsError::NegativeShipping);
        }
        if self.free_shipping_threshold < Money::ZERO {
            return Err(SettingsError::NegativeThreshold);
        }
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(SettingsError::TaxRateOutOfRange);
        }
        Ok(())
    }

    /// Overlay these settings on a pricing config. Express and overnight
    /// rates are not admin-editable and are kept.
    #[must_use]
    pub fn apply_to(&self, pricing: &PricingConfig) -> PricingConfig {
        PricingConfig {
            shipping_cost: self.shipping_cost,
            free_shipping_threshold: self.free_shipping_threshold,
            tax_rate: self.tax_rate,
            ..*pricing
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(StoreSettings::default().validate().is_ok());

        let bad = StoreSettings {
            tax_rate: Decimal::new(15, 1),
            ..StoreSettings::default()
        };
        assert_eq!(bad.validate(), Err(SettingsError::TaxRateOutOfRange));

        let bad = StoreSettings {
            store_name: "  ".to_owned(),
            ..StoreSettings::default()
        };
        assert_eq!(bad.validate(), Err(SettingsError::MissingName));
    }

    #[test]
    fn test_apply_keeps_express_rates() {
        let settings = StoreSettings {
            shipping_cost: Money::from_cents(1000),
            free_shipping_threshold: Money::from_cents(15000),
            tax_rate: Decimal::new(5, 2),
            ..StoreSettings::default()
        };
        let applied = settings.apply_to(&PricingConfig::default());
        assert_eq!(applied.shipping_cost, Money::from_cents(1000));
        assert_eq!(applied.free_shipping_threshold, Money::from_cents(15000));
        assert_eq!(applied.tax_rate, Decimal::new(5, 2));
        assert_eq!(applied.express_rate, PricingConfig::default().express_rate);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: StoreSettings =
            serde_json::from_str(r#"{"store_name":"Noor","tax_rate":"0.1"}"#).unwrap();
        assert_eq!(settings.store_name, "Noor");
        assert_eq!(settings.tax_rate, Decimal::new(1, 1));
        assert_eq!(settings.shipping_cost, Money::from_cents(1500));
    }
}
