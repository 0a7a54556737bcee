//! Integration tests for the order workflow.
//!
//! These tests require a running API server and a migrated `PostgreSQL`
//! database; see the crate docs for setup. Run with:
//!
//! ```bash
//! cargo test -p bramble-integration-tests --test orders -- --ignored
//! ```

use reqwest::StatusCode;
use serde_json::{Value, json};

use bramble_integration_tests::{admin_token, api_url, client, create_category, create_product};

/// Place an order for the given cart and return the response.
async fn place_order(client: &reqwest::Client, items: Value) -> reqwest::Response {
    client
        .post(format!("{}/orders", api_url()))
        .json(&json!({
            "orderItems": items,
            "shippingAddress1": "1 Orchard Lane",
            "city": "Portland",
            "zip": "97201",
            "country": "US",
            "phone": "+1-555-0100",
        }))
        .send()
        .await
        .expect("place order request failed")
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_order_total_is_exact_sum_of_line_items() {
    let client = client();
    let token = admin_token(&client).await;

    let category = create_category(&client, &token, "order-pricing").await;
    let p1 = create_product(&client, &token, "Ten Dollar Item", "10.00", category).await;
    let p2 = create_product(&client, &token, "Five Dollar Item", "5.00", category).await;

    // 2 x 10.00 + 1 x 5.00 = 25.00
    let resp = place_order(
        &client,
        json!([
            {"productId": p1, "quantity": 2},
            {"productId": p2, "quantity": 1},
        ]),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.expect("order response not JSON");

    assert_eq!(order["totalPrice"], json!("25.00"));
    assert_eq!(
        order["lineItemIds"].as_array().map(Vec::len),
        Some(2),
        "line item ids must preserve submission order and count"
    );
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_order_total_snapshot_survives_price_change() {
    let client = client();
    let token = admin_token(&client).await;

    let category = create_category(&client, &token, "order-snapshot").await;
    let product = create_product(&client, &token, "Snapshot Item", "10.00", category).await;

    let resp = place_order(&client, json!([{"productId": product, "quantity": 1}])).await;
    let order: Value = resp.json().await.expect("order response not JSON");
    let order_id = order["id"].as_i64().expect("order id");

    // Raise the product price after the order exists.
    let update = client
        .put(format!("{}/products/{product}", api_url()))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Snapshot Item",
            "description": "Snapshot Item description",
            "price": "99.00",
            "categoryId": category,
            "countInStock": 10,
        }))
        .send()
        .await
        .expect("product update failed");
    assert_eq!(update.status(), StatusCode::OK);

    // The persisted total is unchanged.
    let fetched: Value = client
        .get(format!("{}/orders/{order_id}", api_url()))
        .send()
        .await
        .expect("order fetch failed")
        .json()
        .await
        .expect("order not JSON");
    assert_eq!(fetched["totalPrice"], json!("10.00"));
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_order_with_unknown_product_is_rejected() {
    let client = client();

    let resp = place_order(&client, json!([{"productId": 99_999_999, "quantity": 1}])).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("error body not JSON");
    assert_eq!(body["error"], json!("validation"));
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_empty_cart_is_rejected() {
    let client = client();

    let resp = place_order(&client, json!([])).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_deleting_order_deletes_line_items() {
    let client = client();
    let token = admin_token(&client).await;

    let category = create_category(&client, &token, "order-deletion").await;
    let product = create_product(&client, &token, "Deletable Item", "3.00", category).await;

    let resp = place_order(&client, json!([{"productId": product, "quantity": 2}])).await;
    let order: Value = resp.json().await.expect("order response not JSON");
    let order_id = order["id"].as_i64().expect("order id");

    let delete = client
        .delete(format!("{}/orders/{order_id}", api_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete request failed");
    assert_eq!(delete.status(), StatusCode::OK);

    // The order is gone...
    let fetch = client
        .get(format!("{}/orders/{order_id}", api_url()))
        .send()
        .await
        .expect("fetch request failed");
    assert_eq!(fetch.status(), StatusCode::NOT_FOUND);

    // ...and deleting again reports not found, not an error.
    let again = client
        .delete(format!("{}/orders/{order_id}", api_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("second delete request failed");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_listing_is_newest_first() {
    let client = client();
    let token = admin_token(&client).await;

    let category = create_category(&client, &token, "order-listing").await;
    let product = create_product(&client, &token, "Listed Item", "1.00", category).await;

    let resp = place_order(&client, json!([{"productId": product, "quantity": 1}])).await;
    let order: Value = resp.json().await.expect("order response not JSON");
    let order_id = order["id"].as_i64().expect("order id");

    let listing: Value = client
        .get(format!("{}/orders", api_url()))
        .send()
        .await
        .expect("listing request failed")
        .json()
        .await
        .expect("listing not JSON");

    let first = listing
        .as_array()
        .and_then(|orders| orders.first())
        .expect("listing is empty");
    assert_eq!(
        first["id"].as_i64(),
        Some(order_id),
        "a new order must appear first in the listing"
    );
}

#[tokio::test]
#[ignore = "Requires a freshly migrated, empty database"]
async fn test_total_sales_over_zero_orders_is_zero() {
    let client = client();

    let resp = client
        .get(format!("{}/orders/get/totalsales", api_url()))
        .send()
        .await
        .expect("totalsales request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("totalsales not JSON");
    assert_eq!(body["totalSales"], json!("0"));
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_status_update_touches_only_status() {
    let client = client();
    let token = admin_token(&client).await;

    let category = create_category(&client, &token, "order-status").await;
    let product = create_product(&client, &token, "Status Item", "7.50", category).await;

    let resp = place_order(&client, json!([{"productId": product, "quantity": 2}])).await;
    let order: Value = resp.json().await.expect("order response not JSON");
    let order_id = order["id"].as_i64().expect("order id");

    let updated: Value = client
        .put(format!("{}/orders/{order_id}", api_url()))
        .bearer_auth(&token)
        .json(&json!({"status": "shipped"}))
        .send()
        .await
        .expect("status update failed")
        .json()
        .await
        .expect("update response not JSON");

    assert_eq!(updated["status"], json!("shipped"));
    assert_eq!(updated["totalPrice"], order["totalPrice"]);
    assert_eq!(updated["shippingAddress1"], order["shippingAddress1"]);
}
