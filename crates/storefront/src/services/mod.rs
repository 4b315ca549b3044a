//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password authentication and reset tokens
//! - `cart` - Guest and persistent carts
//! - `checkout` - Promo codes, pricing, and order placement
//! - `email` - Transactional email via SMTP

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod email;

pub use auth::{AuthError, AuthService, Registration};
pub use cart::{CartOwner, CartService, CartServiceError, merge_guest_cart};
pub use checkout::{CheckoutError, CheckoutQuote, CheckoutService};
pub use email::EmailService;
