//! Integration tests for catalog, inventory, order, and settings management.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`el-cli migrate`)
//! - The storefront and admin running

use elegance_integration_tests::{
    admin_client, admin_url, create_category, create_product, expect_redirect, place_order,
    pool, stock_of, unique_slug,
};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_create_category_and_reject_duplicate() {
    let pool = pool().await;
    let (client, _) = admin_client(&pool).await;
    let slug = unique_slug("occasion");

    let form = [
        ("name", slug.as_str()),
        ("slug", slug.as_str()),
        ("description", "Pieces for weddings and Eid"),
        ("image_url", ""),
    ];
    let resp = client
        .post(format!("{}/categories", admin_url()))
        .form(&form)
        .send()
        .await
        .expect("Failed to create category");
    assert!(expect_redirect(&resp).starts_with("/categories?success="));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE slug = $1")
        .bind(&slug)
        .fetch_one(&pool)
        .await
        .expect("Failed to count categories");
    assert_eq!(count, 1);

    let resp = client
        .post(format!("{}/categories", admin_url()))
        .form(&form)
        .send()
        .await
        .expect("Failed to post category");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("Failed to read body").contains("already exists"));
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_delete_category_keeps_products() {
    let pool = pool().await;
    let (client, _) = admin_client(&pool).await;
    let (category_id, _) = create_category(&pool).await;
    let product = create_product(&pool, 4_000, 2).await;
    sqlx::query("UPDATE products SET category_id = $2 WHERE id = $1")
        .bind(product.id)
        .bind(category_id)
        .execute(&pool)
        .await
        .expect("Failed to categorise product");

    let resp = client
        .post(format!("{}/categories/{category_id}/delete", admin_url()))
        .send()
        .await
        .expect("Failed to delete category");
    assert!(expect_redirect(&resp).starts_with("/categories?success="));

    let category: Option<i32> =
        sqlx::query_scalar("SELECT category_id FROM products WHERE id = $1")
            .bind(product.id)
            .fetch_one(&pool)
            .await
            .expect("Product should survive its category");
    assert_eq!(category, None);
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_update_stock() {
    let pool = pool().await;
    let (client, _) = admin_client(&pool).await;
    let product = create_product(&pool, 6_000, 3).await;
    let url = format!("{}/inventory/{}", admin_url(), product.id);

    let resp = client
        .post(&url)
        .form(&[("stock_quantity", "25"), ("return_to", "/inventory?stock=low_stock")])
        .send()
        .await
        .expect("Failed to update stock");
    assert!(expect_redirect(&resp).starts_with("/inventory?stock=low_stock&success="));
    assert_eq!(stock_of(&pool, product.id).await, 25);

    let resp = client
        .post(&url)
        .form(&[("stock_quantity", "-1"), ("return_to", "https://evil.example/")])
        .send()
        .await
        .expect("Failed to update stock");
    assert!(expect_redirect(&resp).starts_with("/inventory?error="));
    assert_eq!(stock_of(&pool, product.id).await, 25);
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_cancelling_order_restocks() {
    let pool = pool().await;
    let (client, _) = admin_client(&pool).await;
    let product = create_product(&pool, 11_000, 5).await;
    let order_id = place_order(&product, 2).await;
    assert_eq!(stock_of(&pool, product.id).await, 3);

    let resp = client
        .get(format!("{}/orders/{order_id}", admin_url()))
        .send()
        .await
        .expect("Failed to load order");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("Failed to read body").contains(&product.name));

    let status_url = format!("{}/orders/{order_id}/status", admin_url());
    let resp = client
        .post(&status_url)
        .form(&[("status", "cancelled")])
        .send()
        .await
        .expect("Failed to cancel order");
    assert!(expect_redirect(&resp).contains("success="));
    assert_eq!(stock_of(&pool, product.id).await, 5);

    // Cancelled orders are final.
    let resp = client
        .post(&status_url)
        .form(&[("status", "shipped")])
        .send()
        .await
        .expect("Failed to post status");
    assert!(expect_redirect(&resp).contains("error="));
    assert_eq!(stock_of(&pool, product.id).await, 5);
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_order_search_by_number() {
    let pool = pool().await;
    let (client, _) = admin_client(&pool).await;
    let product = create_product(&pool, 3_000, 5).await;
    let order_id = place_order(&product, 1).await;

    let resp = client
        .get(format!("{}/orders", admin_url()))
        .query(&[("search", order_id.number())])
        .send()
        .await
        .expect("Failed to search orders");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("Failed to read body").contains(&order_id.number()));
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_invalid_settings_are_not_saved() {
    let pool = pool().await;
    let (client, _) = admin_client(&pool).await;

    let resp = client
        .post(format!("{}/settings", admin_url()))
        .form(&[
            ("store_name", ""),
            ("contact_email", "not-an-email"),
            ("shipping_cost", "15.00"),
            ("free_shipping_threshold", "200.00"),
            ("tax_percent", "8"),
        ])
        .send()
        .await
        .expect("Failed to post settings");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("field-error"));

    let resp = client
        .get(format!("{}/settings", admin_url()))
        .send()
        .await
        .expect("Failed to load settings");
    assert_eq!(resp.status(), StatusCode::OK);
}
