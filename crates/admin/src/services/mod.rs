//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password sign-in restricted to users with the admin role

pub mod auth;

pub use auth::{AdminAuthError, AdminAuthService};
