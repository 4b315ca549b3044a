//! Parsing helpers for admin form submissions.
//!
//! Product forms post repeated `sizes`/`colors` checkbox keys, which
//! `axum::Form` can't collect into a `Vec`, so those forms are read from the
//! raw body with [`FormPairs`].

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use elegance_core::Money;
use elegance_core::checkout::FieldError;

/// Decoded `application/x-www-form-urlencoded` pairs, in submission order.
#[derive(Debug, Clone, Default)]
pub struct FormPairs(Vec<(String, String)>);

impl FormPairs {
    /// Decode a urlencoded body.
    #[must_use]
    pub fn parse(body: &[u8]) -> Self {
        Self(
            url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    /// Last value for `key`, or `""`.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map_or("", |(_, v)| v.as_str())
    }

    /// Every non-blank value for `key`.
    #[must_use]
    pub fn all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_owned())
            .collect()
    }

    /// Whether a checkbox named `key` was ticked.
    #[must_use]
    pub fn checked(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }
}

/// URL slug from a name: lowercase ASCII letters and digits joined by `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_owned()
}

/// Whether a slug is non-empty and only uses `a-z`, `0-9` and single dashes.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Parse a dollar amount such as `1,234.50` or `$89`. Negative values and
/// more than two decimal places are rejected.
#[must_use]
pub fn parse_money(value: &str) -> Option<Money> {
    let cleaned: String = value
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let amount = Decimal::from_str(&cleaned).ok()?;
    (amount >= Decimal::ZERO && amount.scale() <= 2).then(|| Money::new(amount))
}

/// Parse a percentage like `8.5` into a fraction (`0.085`).
#[must_use]
pub fn parse_percent(value: &str) -> Option<Decimal> {
    let percent = Decimal::from_str(value.trim().trim_end_matches('%').trim()).ok()?;
    Some(percent / Decimal::ONE_HUNDRED)
}

/// Parse an `<input type="date">` value.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Trimmed value, or `None` when blank.
#[must_use]
pub fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Non-blank lines of a textarea, trimmed.
#[must_use]
pub fn lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// First error message for a field.
#[must_use]
pub fn error_for<'e>(errors: &'e [FieldError], field: &str) -> Option<&'e str> {
    errors
        .iter()
        .find(|e| e.field == field)
        .map(|e| e.message.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_pairs_repeated_keys() {
        let form = FormPairs::parse(b"name=Classic+Abaya&sizes=S&sizes=M&sizes=&is_active=on");
        assert_eq!(form.get("name"), "Classic Abaya");
        assert_eq!(form.all("sizes"), vec!["S", "M"]);
        assert!(form.checked("is_active"));
        assert!(!form.checked("is_featured"));
        assert_eq!(form.get("missing"), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Classic Black Abaya"), "classic-black-abaya");
        assert_eq!(slugify("  Open-Front / Kimono!! "), "open-front-kimono");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("everyday-abayas-2"));
        assert!(!is_valid_slug("Everyday"));
        assert!(!is_valid_slug("-lead"));
        assert!(!is_valid_slug("a--b"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("89.99"), Some(Money::from_cents(8999)));
        assert_eq!(parse_money("$1,250"), Some(Money::from_cents(125_000)));
        assert_eq!(parse_money("-5"), None);
        assert_eq!(parse_money("1.999"), None);
        assert_eq!(parse_money("abc"), None);
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("8"), Some(Decimal::new(8, 2)));
        assert_eq!(parse_percent("8.5%"), Some(Decimal::new(85, 3)));
        assert_eq!(parse_percent("x"), None);
    }

    #[test]
    fn test_lines_and_non_empty() {
        assert_eq!(
            lines("https://a.test/1.jpg\n\n  https://a.test/2.jpg  \n"),
            vec!["https://a.test/1.jpg", "https://a.test/2.jpg"]
        );
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" SKU-1 ").as_deref(), Some("SKU-1"));
        assert!(parse_date("2025-03-01").is_some());
        assert!(parse_date("03/01/2025").is_none());
    }
}
