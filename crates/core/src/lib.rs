//! Elegance Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Elegance components:
//! - `storefront` - Public-facing shop (catalog, cart, checkout, account)
//! - `admin` - Store administration panel
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything that decides what a customer pays lives
//! here so both binaries agree on it and it can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, phones, and statuses
//! - [`pricing`] - Subtotal, shipping, promo discount, tax, and order totals
//! - [`catalog`] - Product filters, sort orders, and pagination
//! - [`cart`] - Cart line rules and the session-held guest cart
//! - [`checkout`] - Checkout form and payment detail validation
//! - [`reviews`] - Rating summaries for product reviews
//! - [`settings`] - Admin-editable store settings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod pricing;
pub mod reviews;
pub mod settings;
pub mod types;

pub use types::*;
