//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Variables checked for the database URL, in order.
const DATABASE_URL_VARS: &[&str] = &[
    "DATABASE_URL",
    "STOREFRONT_DATABASE_URL",
    "ADMIN_DATABASE_URL",
];

/// Database URL from the environment (loading `.env` first), if any is set.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    DATABASE_URL_VARS
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
}
