//! Integration tests for admin sign-in and access control.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`el-cli migrate`)
//! - The storefront and admin running

use elegance_integration_tests::{
    TEST_PASSWORD, admin_client, admin_login, admin_url, client, expect_redirect, pool, register,
    unique_email,
};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_health() {
    let resp = client()
        .get(format!("{}/health", admin_url()))
        .send()
        .await
        .expect("Failed to call health");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_pages_require_sign_in() {
    let client = client();
    for path in ["/", "/orders", "/products", "/inventory", "/analytics", "/settings"] {
        let resp = client
            .get(format!("{}{path}", admin_url()))
            .send()
            .await
            .expect("Failed to call admin");
        assert_eq!(expect_redirect(&resp), "/auth/login", "{path} was not protected");
    }
}

#[tokio::test]
#[ignore = "Requires running servers"]
async fn test_customer_cannot_sign_in_to_admin() {
    let email = unique_email("customer");
    register(&client(), &email).await;

    let resp = admin_login(&client(), &email, TEST_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("Invalid email or password"));
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_admin_sees_dashboard() {
    let pool = pool().await;
    let (client, _) = admin_client(&pool).await;

    let resp = client
        .get(admin_url())
        .send()
        .await
        .expect("Failed to load dashboard");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("content-security-policy"));
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_revoked_admin_is_signed_out() {
    let pool = pool().await;
    let (client, email) = admin_client(&pool).await;

    sqlx::query("UPDATE users SET role = 'customer' WHERE LOWER(email) = LOWER($1)")
        .bind(&email)
        .execute(&pool)
        .await
        .expect("Failed to demote admin");

    let resp = client
        .get(format!("{}/orders", admin_url()))
        .send()
        .await
        .expect("Failed to load orders");
    assert_eq!(expect_redirect(&resp), "/auth/login");
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_logout_ends_session() {
    let pool = pool().await;
    let (client, _) = admin_client(&pool).await;

    let resp = client
        .post(format!("{}/auth/logout", admin_url()))
        .send()
        .await
        .expect("Failed to sign out");
    assert_eq!(expect_redirect(&resp), "/auth/login");

    let resp = client
        .get(admin_url())
        .send()
        .await
        .expect("Failed to load dashboard");
    assert_eq!(expect_redirect(&resp), "/auth/login");
}
