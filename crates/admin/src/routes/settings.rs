//! Store settings page.
//!
//! The storefront applies saved settings when it next starts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use elegance_core::{Email, Money};
use elegance_core::checkout::FieldError;
use elegance_core::settings::{SettingsError, StoreSettings};

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::filters;
use crate::forms::{error_for, parse_money, parse_percent};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::{Layout, redirect_with_success};

/// Settings form data. Tax is entered as a percentage.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub store_name: String,
    pub contact_email: String,
    pub shipping_cost: String,
    pub free_shipping_threshold: String,
    pub tax_percent: String,
}

impl SettingsForm {
    fn from_settings(settings: &StoreSettings) -> Self {
        Self {
            store_name: settings.store_name.clone(),
            contact_email: settings.contact_email.clone(),
            shipping_cost: settings.shipping_cost.to_plain_string(),
            free_shipping_threshold: settings.free_shipping_threshold.to_plain_string(),
            tax_percent: (settings.tax_rate * Decimal::ONE_HUNDRED)
                .normalize()
                .to_string(),
        }
    }

    fn validate(&self) -> std::result::Result<StoreSettings, Vec<FieldError>> {
        let mut errors = Vec::new();

        let contact_email = self.contact_email.trim();
        let contact_email = if contact_email.is_empty() {
            String::new()
        } else if let Ok(email) = Email::parse(contact_email) {
            email.as_str().to_owned()
        } else {
            errors.push(FieldError::new(
                "contact_email",
                "Enter a valid email address",
            ));
            String::new()
        };

        let shipping_cost = parse_money(&self.shipping_cost).unwrap_or_else(|| {
            errors.push(FieldError::new(
                "shipping_cost",
                "Enter an amount like 15.00",
            ));
            Money::ZERO
        });
        let free_shipping_threshold =
            parse_money(&self.free_shipping_threshold).unwrap_or_else(|| {
                errors.push(FieldError::new(
                    "free_shipping_threshold",
                    "Enter an amount like 200.00",
                ));
                Money::ZERO
            });
        let tax_rate = parse_percent(&self.tax_percent).unwrap_or_else(|| {
            errors.push(FieldError::new("tax_percent", "Enter a percentage like 8"));
            Decimal::ZERO
        });

        let settings = StoreSettings {
            store_name: self.store_name.trim().to_owned(),
            contact_email,
            shipping_cost,
            free_shipping_threshold,
            tax_rate,
        };

        match settings.validate() {
            Ok(()) => {}
            Err(SettingsError::MissingName) => {
                errors.push(FieldError::new("store_name", "Store name is required"));
            }
            Err(SettingsError::TaxRateOutOfRange) => {
                if error_for(&errors, "tax_percent").is_none() {
                    errors.push(FieldError::new(
                        "tax_percent",
                        "Tax must be between 0 and 100 percent",
                    ));
                }
            }
            // Money parsing already rejects negative amounts.
            Err(SettingsError::NegativeShipping | SettingsError::NegativeThreshold) => {}
        }

        if errors.is_empty() {
            Ok(settings)
        } else {
            Err(errors)
        }
    }
}

/// Settings template.
#[derive(Template, WebTemplate)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub layout: Layout,
    pub form: SettingsForm,
    pub errors: Vec<FieldError>,
}

impl SettingsTemplate {
    fn error_for(&self, field: &str) -> Option<&str> {
        error_for(&self.errors, field)
    }
}

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(show).post(update))
}

/// Settings form.
///
/// GET /settings
#[instrument(skip(state, layout, admin), fields(admin_id = %admin.id))]
async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
) -> Result<SettingsTemplate> {
    let settings = SettingsRepository::new(state.pool()).load().await?;
    Ok(SettingsTemplate {
        layout,
        form: SettingsForm::from_settings(&settings),
        errors: Vec::new(),
    })
}

/// Save settings.
///
/// POST /settings
#[instrument(skip(state, layout, admin, form), fields(admin_id = %admin.id))]
async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    let settings = match form.validate() {
        Ok(settings) => settings,
        Err(errors) => {
            return Ok(SettingsTemplate {
                layout,
                form,
                errors,
            }
            .into_response());
        }
    };

    SettingsRepository::new(state.pool()).save(&settings).await?;
    tracing::info!(store_name = %settings.store_name, "Store settings updated");

    Ok(redirect_with_success("/settings", "Settings saved").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> SettingsForm {
        SettingsForm {
            store_name: "Elegance Abayas".to_owned(),
            contact_email: "Hello@Elegance.test".to_owned(),
            shipping_cost: "15.00".to_owned(),
            free_shipping_threshold: "$200".to_owned(),
            tax_percent: "8".to_owned(),
        }
    }

    #[test]
    fn test_valid_form() {
        let settings = form().validate().unwrap();
        assert_eq!(settings.contact_email, "hello@elegance.test");
        assert_eq!(settings.shipping_cost, Money::from_cents(1500));
        assert_eq!(settings.free_shipping_threshold, Money::from_cents(20_000));
        assert_eq!(settings.tax_rate, Decimal::new(8, 2));
    }

    #[test]
    fn test_blank_contact_email_is_allowed() {
        let settings = SettingsForm {
            contact_email: String::new(),
            ..form()
        }
        .validate()
        .unwrap();
        assert!(settings.contact_email.is_empty());
    }

    #[test]
    fn test_invalid_fields() {
        let errors = SettingsForm {
            store_name: " ".to_owned(),
            contact_email: "not-an-email".to_owned(),
            shipping_cost: "-5".to_owned(),
            tax_percent: "150".to_owned(),
            ..form()
        }
        .validate()
        .unwrap_err();

        for field in ["store_name", "contact_email", "shipping_cost", "tax_percent"] {
            assert!(error_for(&errors, field).is_some(), "missing error for {field}");
        }
        assert!(error_for(&errors, "free_shipping_threshold").is_none());
    }

    #[test]
    fn test_form_round_trips_tax_as_percent() {
        let settings = StoreSettings {
            tax_rate: Decimal::new(85, 3),
            ..StoreSettings::default()
        };
        assert_eq!(SettingsForm::from_settings(&settings).tax_percent, "8.5");
    }
}
