//! View data shared by page templates.
//!
//! Every admin page extends `base.html`, which needs the sidebar and banner
//! data in [`Layout`].

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Sidebar, header, and status-banner data for `base.html`.
#[derive(Debug, Clone)]
pub struct Layout {
    pub admin_name: Option<String>,
    pub storefront_url: Option<String>,
    /// Banner text from an `?error=` redirect.
    pub error: Option<String>,
    /// Banner text from a `?success=` redirect.
    pub success: Option<String>,
    pub path: String,
}

impl Layout {
    /// Whether a sidebar link should be highlighted.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.path == "/"
        } else {
            self.path.starts_with(prefix)
        }
    }
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        let (error, success) = status_messages(parts.uri.query());

        Ok(Self {
            admin_name: admin.map(|a| a.name),
            storefront_url: state.config().storefront_url.clone(),
            error,
            success,
            path: parts.uri.path().to_owned(),
        })
    }
}

/// Pull `error` and `success` out of a query string. Blank values are ignored.
fn status_messages(query: Option<&str>) -> (Option<String>, Option<String>) {
    let mut error = None;
    let mut success = None;
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "error" => error = Some(value.to_owned()),
            "success" => success = Some(value.to_owned()),
            _ => {}
        }
    }
    (error, success)
}

/// Redirect to `path` with an error banner.
#[must_use]
pub fn redirect_with_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_message(path, "error", message))
}

/// Redirect to `path` with a success banner.
#[must_use]
pub fn redirect_with_success(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_message(path, "success", message))
}

fn with_message(path: &str, key: &str, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={}", urlencoding::encode(message))
}

/// Date shown in list tables.
#[must_use]
pub fn short_date(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(
            status_messages(Some("success=Product%20saved&page=2")),
            (None, Some("Product saved".to_owned()))
        );
        assert_eq!(
            status_messages(Some("error=Bad&success=")),
            (Some("Bad".to_owned()), None)
        );
    }

    #[test]
    fn test_with_message() {
        assert_eq!(
            with_message("/orders/7", "success", "Status updated"),
            "/orders/7?success=Status%20updated"
        );
        assert_eq!(
            with_message("/products?page=2", "error", "Not found"),
            "/products?page=2&error=Not%20found"
        );
    }

    #[test]
    fn test_is_active() {
        let layout = Layout {
            admin_name: None,
            storefront_url: None,
            error: None,
            success: None,
            path: "/products/3/edit".to_owned(),
        };
        assert!(layout.is_active("/products"));
        assert!(!layout.is_active("/"));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_short_date() {
        let at = chrono::Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(short_date(at), "Mar 7, 2025");
    }
}
