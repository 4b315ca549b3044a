//! Integration tests for browsing the storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`el-cli migrate`)
//! - The storefront running (cargo run -p elegance-storefront)

use elegance_integration_tests::{client, create_product, pool, storefront_url};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to call health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to call readiness");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_pages_carry_security_headers() {
    let resp = client()
        .get(storefront_url())
        .send()
        .await
        .expect("Failed to load home page");

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers.get("x-frame-options").map(|v| v.as_bytes()), Some(&b"DENY"[..]));
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_product_page_and_search() {
    let pool = pool().await;
    let product = create_product(&pool, 8_900, 12).await;
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/products/{}", product.slug))
        .send()
        .await
        .expect("Failed to load product page");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains(&product.name));
    assert!(body.contains("$89.00"));

    let resp = client
        .get(format!("{base_url}/products"))
        .query(&[("search", product.name.as_str())])
        .send()
        .await
        .expect("Failed to search products");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("Failed to read body").contains(&product.slug));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_is_404() {
    let resp = client()
        .get(format!("{}/products/no-such-abaya-here", storefront_url()))
        .send()
        .await
        .expect("Failed to load product page");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_catalog_ignores_bad_filters() {
    let resp = client()
        .get(format!("{}/products", storefront_url()))
        .query(&[
            ("sort", "sideways"),
            ("min_price", "abc"),
            ("page", "9999"),
        ])
        .send()
        .await
        .expect("Failed to load catalog");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_reviews_sorted_by_rating() {
    let pool = pool().await;
    let product = create_product(&pool, 9_000, 3).await;
    for (rating, title) in [(2_i16, "Runs small"), (5_i16, "Beautiful drape"), (4_i16, "Lovely")] {
        sqlx::query(
            r"
            INSERT INTO reviews (product_id, reviewer_name, reviewer_email, rating, title, comment, status)
            VALUES ($1, 'Test Shopper', 'shopper@example.com', $2, $3, 'Test review', 'approved')
            ",
        )
        .bind(product.id)
        .bind(rating)
        .bind(title)
        .execute(&pool)
        .await
        .expect("Failed to insert review");
    }

    let client = client();
    let url = format!("{}/products/{}", storefront_url(), product.slug);
    for (sort, first, last) in [
        ("highest", "Beautiful drape", "Runs small"),
        ("lowest", "Runs small", "Beautiful drape"),
    ] {
        let body = client
            .get(&url)
            .query(&[("review_sort", sort)])
            .send()
            .await
            .expect("Failed to load product")
            .text()
            .await
            .expect("Failed to read body");
        let first_at = body.find(first).expect("first review missing");
        let last_at = body.find(last).expect("last review missing");
        assert!(first_at < last_at, "{sort}: {first} should come before {last}");
    }
}
