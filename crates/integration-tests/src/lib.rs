//! Integration tests for Elegance.
//!
//! The tests drive running servers over HTTP and prepare fixtures directly
//! in the shared database. They are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p elegance-cli -- migrate
//! cargo run -p elegance-storefront &
//! cargo run -p elegance-admin &
//! cargo test -p elegance-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - Database both servers use
//! - `STOREFRONT_TEST_URL` - Storefront address (default: `http://localhost:3000`)
//! - `ADMIN_TEST_URL` - Admin address (default: `http://localhost:3001`)

#![allow(clippy::missing_panics_doc)]

use elegance_core::{CategoryId, OrderId, ProductId};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode, redirect};
use sqlx::PgPool;

/// Password used for every account the tests register.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of the admin panel under test.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_TEST_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// HTTP client with a cookie jar that does not follow redirects, so tests
/// can assert on `Location`.
///
/// Each client claims its own forwarded address so the storefront's per-IP
/// rate limits apply per client rather than to the whole test run.
#[must_use]
pub fn client() -> Client {
    let [a, b, c, ..] = *uuid::Uuid::new_v4().as_bytes();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).expect("Invalid forwarded address"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the shared test database.
pub async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to test database")
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@integration.elegance.test", uuid::Uuid::new_v4().simple())
}

/// A slug no other test run has used.
#[must_use]
pub fn unique_slug(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Assert a 303 redirect and return its target.
#[must_use]
pub fn expect_redirect(response: &Response) -> String {
    assert_eq!(
        response.status(),
        StatusCode::SEE_OTHER,
        "expected a redirect from {}",
        response.url()
    );
    location(response)
}

/// Register a storefront account; the client is signed in afterwards.
pub async fn register(client: &Client, email: &str) -> Response {
    client
        .post(format!("{}/auth/register", storefront_url()))
        .form(&[
            ("first_name", "Test"),
            ("last_name", "Shopper"),
            ("email", email),
            ("password", TEST_PASSWORD),
            ("password_confirm", TEST_PASSWORD),
        ])
        .send()
        .await
        .expect("Failed to register")
}

/// Sign in to the storefront.
pub async fn storefront_login(client: &Client, email: &str, password: &str) -> Response {
    client
        .post(format!("{}/auth/login", storefront_url()))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .expect("Failed to sign in")
}

/// Sign in to the admin panel.
pub async fn admin_login(client: &Client, email: &str, password: &str) -> Response {
    client
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .expect("Failed to sign in to admin")
}

/// Register an account, give it the admin role, and return a client signed
/// in to the admin panel along with the account email.
pub async fn admin_client(pool: &PgPool) -> (Client, String) {
    let email = unique_email("admin");
    let storefront = client();
    let response = register(&storefront, &email).await;
    assert!(response.status().is_redirection(), "registration failed");

    sqlx::query("UPDATE users SET role = 'admin' WHERE LOWER(email) = LOWER($1)")
        .bind(&email)
        .execute(pool)
        .await
        .expect("Failed to promote test admin");

    let admin = client();
    let response = admin_login(&admin, &email, TEST_PASSWORD).await;
    assert_eq!(expect_redirect(&response), "/", "admin login failed");
    (admin, email)
}

/// A product created for one test.
#[derive(Debug, Clone)]
pub struct TestProduct {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
}

/// Insert an active product in size M and color Black.
pub async fn create_product(pool: &PgPool, price_cents: i64, stock: i32) -> TestProduct {
    let slug = unique_slug("test-abaya");
    let name = format!("Test Abaya {}", &slug[slug.len() - 6..]);
    let id = sqlx::query_scalar::<_, ProductId>(
        r"
        INSERT INTO products (name, slug, price, stock_quantity, sizes, colors)
        VALUES ($1, $2, $3::NUMERIC / 100, $4, '{M}', '{Black}')
        RETURNING id
        ",
    )
    .bind(&name)
    .bind(&slug)
    .bind(price_cents)
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("Failed to create test product");

    TestProduct { id, slug, name }
}

/// Current stock of a product.
pub async fn stock_of(pool: &PgPool, id: ProductId) -> i32 {
    sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("Failed to read stock")
}

/// Insert a category for one test.
pub async fn create_category(pool: &PgPool) -> (CategoryId, String) {
    let slug = unique_slug("test-category");
    let id = sqlx::query_scalar::<_, CategoryId>(
        "INSERT INTO categories (name, slug) VALUES ($1, $1) RETURNING id",
    )
    .bind(&slug)
    .fetch_one(pool)
    .await
    .expect("Failed to create test category");
    (id, slug)
}

/// Add a product to the signed-in (or guest) cart.
pub async fn add_to_cart(client: &Client, product: &TestProduct, quantity: u32) -> Response {
    client
        .post(format!("{}/cart/add", storefront_url()))
        .form(&[
            ("product_id", product.id.to_string()),
            ("quantity", quantity.to_string()),
            ("size", "M".to_string()),
            ("color", "Black".to_string()),
        ])
        .send()
        .await
        .expect("Failed to add to cart")
}

/// A checkout form that passes validation, paying by card with standard shipping.
#[must_use]
pub fn checkout_form(email: &str) -> Vec<(&'static str, String)> {
    [
        ("email", email),
        ("phone", "+1 555 010 2030"),
        ("first_name", "Test"),
        ("last_name", "Shopper"),
        ("address", "1 Market Street"),
        ("city", "Dearborn"),
        ("state", "MI"),
        ("zip_code", "48126"),
        ("country", "US"),
        ("shipping_method", "standard"),
        ("payment_method", "card"),
        ("card_number", "4242 4242 4242 4242"),
        ("card_expiry", "12/39"),
        ("card_cvv", "123"),
        ("card_name", "Test Shopper"),
        ("billing_same", "on"),
    ]
    .into_iter()
    .map(|(k, v)| (k, v.to_string()))
    .collect()
}

/// Register a shopper and place a card order for `quantity` of `product`.
pub async fn place_order(product: &TestProduct, quantity: u32) -> OrderId {
    let client = client();
    let email = unique_email("order");
    register(&client, &email).await;
    add_to_cart(&client, product, quantity).await;

    let response = client
        .post(format!("{}/checkout", storefront_url()))
        .form(&checkout_form(&email))
        .send()
        .await
        .expect("Failed to place order");
    let target = expect_redirect(&response);
    target
        .strip_prefix("/checkout/success/")
        .and_then(OrderId::parse_number)
        .unwrap_or_else(|| panic!("unexpected checkout redirect: {target}"))
}
