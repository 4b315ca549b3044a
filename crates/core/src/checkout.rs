//! Checkout form validation.
//!
//! The form is validated as a whole: every problem is collected so the page
//! can show all of them at once instead of one per submit.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{Email, PaymentMethod, Phone, ShippingMethod};

/// Country used when none is given.
pub const DEFAULT_COUNTRY: &str = "US";

/// A problem with one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A postal address, stored as JSON on orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Address {
    /// Single-line rendering for order lists.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut out = self.address.clone();
        if let Some(apt) = self.apartment.as_deref().filter(|a| !a.is_empty()) {
            out.push_str(", ");
            out.push_str(apt);
        }
        format!("{out}, {}, {} {}, {}", self.city, self.state, self.zip_code, self.country)
    }
}

/// Raw address fields as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressInput {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl AddressInput {
    /// Validate, pushing problems onto `errors` with field names prefixed by
    /// `prefix` (`""` or `"billing_"`).
    pub fn validate(&self, prefix: &'static str, errors: &mut Vec<FieldError>) -> Option<Address> {
        let before = errors.len();
        let required: [(&'static str, &'static str, &str); 6] = [
            ("first_name", "billing_first_name", &self.first_name),
            ("last_name", "billing_last_name", &self.last_name),
            ("address", "billing_address", &self.address),
            ("city", "billing_city", &self.city),
            ("state", "billing_state", &self.state),
            ("zip_code", "billing_zip_code", &self.zip_code),
        ];
        for (plain, billing, value) in required {
            if value.trim().is_empty() {
                let field = if prefix.is_empty() { plain } else { billing };
                errors.push(FieldError::new(field, "This field is required"));
            }
        }
        if errors.len() != before {
            return None;
        }

        let apartment = self.apartment.trim();
        let country = self.country.trim();
        Some(Address {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            apartment: (!apartment.is_empty()).then(|| apartment.to_owned()),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self.zip_code.trim().to_owned(),
            country: if country.is_empty() {
                DEFAULT_COUNTRY.to_owned()
            } else {
                country.to_owned()
            },
        })
    }
}

/// Whether a card number has 13 to 19 digits once spaces are removed.
#[must_use]
pub fn is_valid_card_number(number: &str) -> bool {
    let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
    (13..=19).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Whether an `MM/YY` expiry is a real month after the current one.
#[must_use]
pub fn is_valid_expiry(expiry: &str, today: NaiveDate) -> bool {
    let Some((mm, yy)) = expiry.trim().split_once('/') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(mm) || !two_digits(yy) {
        return false;
    }
    let (Ok(month), Ok(year)) = (mm.parse::<u32>(), yy.parse::<i32>()) else {
        return false;
    };
    if !(1..=12).contains(&month) {
        return false;
    }
    (2000 + year, month) > (today.year(), today.month())
}

/// Whether a CVV is three or four digits.
#[must_use]
pub fn is_valid_cvv(cvv: &str) -> bool {
    (3..=4).contains(&cvv.len()) && cvv.chars().all(|c| c.is_ascii_digit())
}

/// The checkout form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub shipping_method: ShippingMethod,
    pub payment_method: PaymentMethod,
    pub card_number: String,
    pub card_expiry: String,
    pub card_cvv: String,
    pub card_name: String,
    /// Checkbox; absent when unchecked.
    pub billing_same: Option<String>,
    pub billing_first_name: String,
    pub billing_last_name: String,
    pub billing_address: String,
    pub billing_apartment: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_zip_code: String,
    pub billing_country: String,
}

/// Checkout details that passed validation. Card details are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub email: Email,
    pub phone: Phone,
    pub shipping_address: Address,
    /// `None` when billing is the same as shipping.
    pub billing_address: Option<Address>,
    pub shipping_method: ShippingMethod,
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    #[must_use]
    pub fn billing_same_as_shipping(&self) -> bool {
        self.billing_same.is_some()
    }

    fn shipping_input(&self) -> AddressInput {
        AddressInput {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            address: self.address.clone(),
            apartment: self.apartment.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone(),
        }
    }

    fn billing_input(&self) -> AddressInput {
        AddressInput {
            first_name: self.billing_first_name.clone(),
            last_name: self.billing_last_name.clone(),
            address: self.billing_address.clone(),
            apartment: self.billing_apartment.clone(),
            city: self.billing_city.clone(),
            state: self.billing_state.clone(),
            zip_code: self.billing_zip_code.clone(),
            country: self.billing_country.clone(),
        }
    }

    /// Validate the whole form.
    ///
    /// # Errors
    ///
    /// Returns every [`FieldError`] found.
    pub fn validate(&self, today: NaiveDate) -> Result<ValidatedCheckout, Vec<FieldError>> {
        let mut errors = Vec::new();

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push(FieldError::new("email", capitalize(&e.to_string())));
                None
            }
        };
        let phone = match Phone::parse(&self.phone) {
            Ok(phone) => Some(phone),
            Err(e) => {
                errors.push(FieldError::new("phone", capitalize(&e.to_string())));
                None
            }
        };

        let shipping_address = self.shipping_input().validate("", &mut errors);
        let billing_address = if self.billing_same_as_shipping() {
            None
        } else {
            self.billing_input().validate("billing_", &mut errors)
        };

        if self.payment_method == PaymentMethod::Card {
            if !is_valid_card_number(&self.card_number) {
                errors.push(FieldError::new("card_number", "Please enter a valid card number"));
            }
            if !is_valid_expiry(&self.card_expiry, today) {
                errors.push(FieldError::new("card_expiry", "Please enter a valid expiry date (MM/YY)"));
            }
            if !is_valid_cvv(&self.card_cvv) {
                errors.push(FieldError::new("card_cvv", "Please enter a valid CVV"));
            }
            if self.card_name.trim().is_empty() {
                errors.push(FieldError::new("card_name", "Please enter the name on the card"));
            }
        }

        match (email, phone, shipping_address) {
            (Some(email), Some(phone), Some(shipping_address)) if errors.is_empty() => {
                Ok(ValidatedCheckout {
                    email,
                    phone,
                    shipping_address,
                    billing_address,
                    shipping_method: self.shipping_method,
                    payment_method: self.payment_method,
                })
            }
            _ => Err(errors),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            email: "layla@example.com".to_owned(),
            phone: "+1 555 010 2030".to_owned(),
            first_name: "Layla".to_owned(),
            last_name: "Hassan".to_owned(),
            address: "12 Palm Street".to_owned(),
            city: "Austin".to_owned(),
            state: "TX".to_owned(),
            zip_code: "73301".to_owned(),
            card_number: "4242 4242 4242 4242".to_owned(),
            card_expiry: "12/27".to_owned(),
            card_cvv: "123".to_owned(),
            card_name: "Layla Hassan".to_owned(),
            billing_same: Some("on".to_owned()),
            ..CheckoutForm::default()
        }
    }

    #[test]
    fn test_card_number() {
        assert!(is_valid_card_number("4242 4242 4242 4242"));
        assert!(is_valid_card_number("4222222222222"));
        assert!(!is_valid_card_number("422222222222"));
        assert!(!is_valid_card_number("4242-4242-4242-4242"));
        assert!(!is_valid_card_number("42424242424242424242"));
    }

    #[test]
    fn test_expiry_must_be_after_current_month() {
        assert!(is_valid_expiry("07/25", today()));
        assert!(!is_valid_expiry("06/25", today()));
        assert!(!is_valid_expiry("05/25", today()));
        assert!(!is_valid_expiry("13/30", today()));
        assert!(!is_valid_expiry("00/30", today()));
        assert!(!is_valid_expiry("7/25", today()));
        assert!(!is_valid_expiry("0725", today()));
    }

    #[test]
    fn test_expiry_rejects_signs() {
        assert!(!is_valid_expiry("+1/30", today()));
        assert!(!is_valid_expiry("12/+9", today()));
        assert!(!is_valid_expiry("-1/30", today()));
        assert!(!is_valid_expiry("1 /30", today()));
        assert!(is_valid_expiry("01/30", today()));
    }

    #[test]
    fn test_cvv() {
        assert!(is_valid_cvv("123"));
        assert!(is_valid_cvv("1234"));
        assert!(!is_valid_cvv("12"));
        assert!(!is_valid_cvv("12a"));
    }

    #[test]
    fn test_valid_form() {
        let checkout = valid_form().validate(today()).unwrap();
        assert_eq!(checkout.email.as_str(), "layla@example.com");
        assert_eq!(checkout.shipping_address.country, "US");
        assert_eq!(checkout.billing_address, None);
        assert_eq!(checkout.shipping_method, ShippingMethod::Standard);
    }

    #[test]
    fn test_collects_all_errors() {
        let form = CheckoutForm {
            email: "bad".to_owned(),
            card_cvv: "1".to_owned(),
            city: String::new(),
            ..valid_form()
        };
        let errors = form.validate(today()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"city"));
        assert!(fields.contains(&"card_cvv"));
        assert!(!fields.contains(&"card_number"));
    }

    #[test]
    fn test_paypal_skips_card_checks() {
        let form = CheckoutForm {
            payment_method: PaymentMethod::Paypal,
            card_number: String::new(),
            card_expiry: String::new(),
            card_cvv: String::new(),
            card_name: String::new(),
            ..valid_form()
        };
        assert!(form.validate(today()).is_ok());
    }

    #[test]
    fn test_separate_billing_address_required() {
        let form = CheckoutForm {
            billing_same: None,
            ..valid_form()
        };
        let errors = form.validate(today()).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "billing_address"));

        let form = CheckoutForm {
            billing_same: None,
            billing_first_name: "Omar".to_owned(),
            billing_last_name: "Hassan".to_owned(),
            billing_address: "1 Main St".to_owned(),
            billing_city: "Dallas".to_owned(),
            billing_state: "TX".to_owned(),
            billing_zip_code: "75001".to_owned(),
            ..valid_form()
        };
        let checkout = form.validate(today()).unwrap();
        assert_eq!(checkout.billing_address.unwrap().city, "Dallas");
    }

    #[test]
    fn test_address_one_line() {
        let address = Address {
            address: "12 Palm Street".to_owned(),
            apartment: Some("Apt 4".to_owned()),
            city: "Austin".to_owned(),
            state: "TX".to_owned(),
            zip_code: "73301".to_owned(),
            country: "US".to_owned(),
            ..Address::default()
        };
        assert_eq!(address.one_line(), "12 Palm Street, Apt 4, Austin, TX 73301, US");
    }
}
