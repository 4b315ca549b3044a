//! Integration tests for registration, sign-in, and account pages.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`el-cli migrate`)
//! - The storefront running (cargo run -p elegance-storefront)

use elegance_integration_tests::{
    TEST_PASSWORD, client, expect_redirect, register, storefront_login, storefront_url,
    unique_email,
};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_account_requires_sign_in() {
    let resp = client()
        .get(format!("{}/account/orders", storefront_url()))
        .send()
        .await
        .expect("Failed to load account");

    assert_eq!(expect_redirect(&resp), "/auth/login?next=%2Faccount%2Forders");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_sign_out_and_back_in() {
    let client = client();
    let base_url = storefront_url();
    let email = unique_email("shopper");

    let resp = register(&client, &email).await;
    assert!(expect_redirect(&resp).starts_with('/'));

    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .expect("Failed to load account");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to sign out");
    assert_eq!(expect_redirect(&resp), "/");

    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .expect("Failed to load account");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = storefront_login(&client, &email.to_uppercase(), TEST_PASSWORD).await;
    assert_eq!(expect_redirect(&resp), "/account");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_registration_is_rejected() {
    let email = unique_email("duplicate");
    let resp = register(&client(), &email).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = register(&client(), &email).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_wrong_password_is_rejected() {
    let email = unique_email("wrong-password");
    register(&client(), &email).await;

    let resp = storefront_login(&client(), &email, "not-the-password").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("Invalid email or password"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_login_ignores_offsite_next() {
    let email = unique_email("next");
    register(&client(), &email).await;

    let client = client();
    let resp = client
        .post(format!("{}/auth/login", storefront_url()))
        .form(&[
            ("email", email.as_str()),
            ("password", TEST_PASSWORD),
            ("next", "https://evil.example/"),
        ])
        .send()
        .await
        .expect("Failed to sign in");
    assert_eq!(expect_redirect(&resp), "/account");
}
