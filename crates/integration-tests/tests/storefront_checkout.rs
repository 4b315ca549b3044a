//! Integration tests for the cart and checkout flow.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`el-cli migrate`)
//! - The storefront running (cargo run -p elegance-storefront)

use elegance_integration_tests::{
    add_to_cart, checkout_form, client, create_product, expect_redirect, pool, register,
    stock_of, storefront_url, unique_email,
};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_guest_cart_then_checkout_requires_sign_in() {
    let pool = pool().await;
    let product = create_product(&pool, 12_000, 5).await;
    let client = client();
    let base_url = storefront_url();

    let resp = add_to_cart(&client, &product, 1).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .get(format!("{base_url}/cart/count"))
        .send()
        .await
        .expect("Failed to read cart count");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("Failed to read body").contains('1'));

    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to load checkout");
    assert_eq!(expect_redirect(&resp), "/auth/login?next=%2Fcheckout");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_guest_cart_survives_registration() {
    let pool = pool().await;
    let product = create_product(&pool, 7_500, 5).await;
    let client = client();

    add_to_cart(&client, &product, 2).await;
    register(&client, &unique_email("merge")).await;

    let resp = client
        .get(format!("{}/cart", storefront_url()))
        .send()
        .await
        .expect("Failed to load cart");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("Failed to read body").contains(&product.name));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_guest_cart_merge_skips_stale_products() {
    let pool = pool().await;
    let kept = create_product(&pool, 6_000, 5).await;
    let stale = create_product(&pool, 6_500, 5).await;
    let client = client();

    add_to_cart(&client, &stale, 1).await;
    add_to_cart(&client, &kept, 1).await;
    sqlx::query("UPDATE products SET is_active = FALSE WHERE id = $1")
        .bind(stale.id)
        .execute(&pool)
        .await
        .expect("Failed to deactivate product");
    register(&client, &unique_email("stale")).await;

    let body = client
        .get(format!("{}/cart", storefront_url()))
        .send()
        .await
        .expect("Failed to load cart")
        .text()
        .await
        .expect("Failed to read body");
    assert!(body.contains(&kept.name));
    assert!(!body.contains(&stale.name));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_place_order_decrements_stock() {
    let pool = pool().await;
    let product = create_product(&pool, 15_000, 4).await;
    let client = client();
    let base_url = storefront_url();
    let email = unique_email("buyer");

    register(&client, &email).await;
    add_to_cart(&client, &product, 3).await;

    let resp = client
        .post(format!("{base_url}/checkout"))
        .form(&checkout_form(&email))
        .send()
        .await
        .expect("Failed to place order");
    let target = expect_redirect(&resp);
    assert!(target.starts_with("/checkout/success/"), "got {target}");
    assert_eq!(stock_of(&pool, product.id).await, 1);

    let resp = client
        .get(format!("{base_url}{target}"))
        .send()
        .await
        .expect("Failed to load confirmation");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("Failed to read body").contains(&product.name));

    // The cart is emptied by a successful order.
    let resp = client
        .post(format!("{base_url}/checkout"))
        .form(&checkout_form(&email))
        .send()
        .await
        .expect("Failed to post checkout");
    assert!(expect_redirect(&resp).starts_with("/cart?error="));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cannot_buy_more_than_stock() {
    let pool = pool().await;
    let product = create_product(&pool, 9_900, 1).await;
    let client = client();
    let email = unique_email("greedy");
    register(&client, &email).await;
    add_to_cart(&client, &product, 2).await;

    let resp = client
        .post(format!("{}/checkout", storefront_url()))
        .form(&checkout_form(&email))
        .send()
        .await
        .expect("Failed to post checkout");
    assert!(expect_redirect(&resp).starts_with("/cart?error="));
    assert_eq!(stock_of(&pool, product.id).await, 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_promo_code_applies() {
    let pool = pool().await;
    let product = create_product(&pool, 10_000, 5).await;
    let client = client();
    let base_url = storefront_url();
    register(&client, &unique_email("promo")).await;
    add_to_cart(&client, &product, 1).await;

    let resp = client
        .post(format!("{base_url}/checkout/promo"))
        .form(&[("code", " welcome10 ")])
        .send()
        .await
        .expect("Failed to apply promo");
    assert!(expect_redirect(&resp).starts_with("/checkout?success="));

    let resp = client
        .post(format!("{base_url}/checkout/promo"))
        .form(&[("code", "NOT-A-CODE")])
        .send()
        .await
        .expect("Failed to apply promo");
    assert!(expect_redirect(&resp).starts_with("/checkout?error="));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_invalid_card_is_rejected() {
    let pool = pool().await;
    let product = create_product(&pool, 5_000, 5).await;
    let client = client();
    let email = unique_email("bad-card");
    register(&client, &email).await;
    add_to_cart(&client, &product, 1).await;

    let form: Vec<(&str, String)> = checkout_form(&email)
        .into_iter()
        .map(|(k, v)| match k {
            "card_number" => (k, "1234".to_string()),
            "card_expiry" => (k, "01/20".to_string()),
            _ => (k, v),
        })
        .collect();

    let resp = client
        .post(format!("{}/checkout", storefront_url()))
        .form(&form)
        .send()
        .await
        .expect("Failed to post checkout");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(stock_of(&pool, product.id).await, 5);
}
