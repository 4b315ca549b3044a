//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use elegance_core::{Email, UserId, UserRole};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Shown in the header greeting.
    pub first_name: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// Name for the header, falling back to the email's local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.first_name.is_empty() {
            self.email
                .as_str()
                .split('@')
                .next()
                .unwrap_or_default()
        } else {
            &self.first_name
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the anonymous visitor's cart.
    pub const GUEST_CART: &str = "guest_cart";

    /// Key for the promo code applied at checkout.
    pub const PROMO_CODE: &str = "promo_code";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user = CurrentUser {
            id: UserId::new(1),
            email: Email::parse("layla@example.com").unwrap(),
            first_name: String::new(),
            role: UserRole::Customer,
        };
        assert_eq!(user.display_name(), "layla");

        user.first_name = "Layla".to_owned();
        assert_eq!(user.display_name(), "Layla");
    }
}
