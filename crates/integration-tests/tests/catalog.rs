//! Integration tests for the catalog: categories, products, filters.
//!
//! Requires a running API server and migrated database; run with
//! `cargo test -p bramble-integration-tests --test catalog -- --ignored`.

use reqwest::StatusCode;
use serde_json::{Value, json};

use bramble_integration_tests::{admin_token, api_url, client, create_category, create_product};

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_category_crud_roundtrip() {
    let client = client();
    let token = admin_token(&client).await;

    let id = create_category(&client, &token, "crud-roundtrip").await;

    // Read it back without a token; category reads are public.
    let fetched: Value = client
        .get(format!("{}/categories/{id}", api_url()))
        .send()
        .await
        .expect("category fetch failed")
        .json()
        .await
        .expect("category not JSON");
    assert_eq!(fetched["name"], json!("crud-roundtrip"));

    // Full-field replace.
    let updated: Value = client
        .put(format!("{}/categories/{id}", api_url()))
        .bearer_auth(&token)
        .json(&json!({"name": "crud-renamed", "color": "#123456", "icon": "star"}))
        .send()
        .await
        .expect("category update failed")
        .json()
        .await
        .expect("update not JSON");
    assert_eq!(updated["name"], json!("crud-renamed"));
    assert_eq!(updated["color"], json!("#123456"));

    // Delete, then reads answer 404.
    let deleted = client
        .delete(format!("{}/categories/{id}", api_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("category delete failed");
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = client
        .get(format!("{}/categories/{id}", api_url()))
        .send()
        .await
        .expect("category fetch failed");
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_product_creation_rejects_unknown_category() {
    let client = client();
    let token = admin_token(&client).await;

    let before: Value = client
        .get(format!("{}/products/get/count", api_url()))
        .send()
        .await
        .expect("count request failed")
        .json()
        .await
        .expect("count not JSON");

    let image = reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4E, 0x47])
        .file_name("x.png")
        .mime_str("image/png")
        .expect("valid mime");
    let form = reqwest::multipart::Form::new()
        .text("name", "Orphan Product")
        .text("description", "references a category that does not exist")
        .text("price", "5.00")
        .text("categoryId", "99999999")
        .text("countInStock", "1")
        .part("image", image);

    let resp = client
        .post(format!("{}/products", api_url()))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .expect("create product request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Nothing was persisted.
    let after: Value = client
        .get(format!("{}/products/get/count", api_url()))
        .send()
        .await
        .expect("count request failed")
        .json()
        .await
        .expect("count not JSON");
    assert_eq!(before["productCount"], after["productCount"]);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_product_upload_rejects_non_image_type() {
    let client = client();
    let token = admin_token(&client).await;
    let category = create_category(&client, &token, "catalog-mime").await;

    let file = reqwest::multipart::Part::bytes(b"#!/bin/sh".to_vec())
        .file_name("script.sh")
        .mime_str("application/x-sh")
        .expect("valid mime");
    let form = reqwest::multipart::Form::new()
        .text("name", "Script Product")
        .text("description", "not an image")
        .text("price", "5.00")
        .text("categoryId", category.to_string())
        .text("countInStock", "1")
        .part("image", file);

    let resp = client
        .post(format!("{}/products", api_url()))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .expect("create product request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_category_filter_restricts_listing() {
    let client = client();
    let token = admin_token(&client).await;

    let wanted = create_category(&client, &token, "filter-wanted").await;
    let other = create_category(&client, &token, "filter-other").await;
    let in_wanted = create_product(&client, &token, "Wanted Product", "1.00", wanted).await;
    let _in_other = create_product(&client, &token, "Other Product", "1.00", other).await;

    let listing: Value = client
        .get(format!("{}/products?categories={wanted}", api_url()))
        .send()
        .await
        .expect("filtered listing failed")
        .json()
        .await
        .expect("listing not JSON");

    let products = listing.as_array().expect("listing is an array");
    assert!(
        products
            .iter()
            .any(|p| p["id"].as_i64() == Some(in_wanted)),
        "filtered listing must contain the matching product"
    );
    assert!(
        products
            .iter()
            .all(|p| p["categoryId"].as_i64() == Some(wanted)),
        "filtered listing must only contain the requested categories"
    );
    // The expansion carries the full category object.
    assert!(
        products
            .iter()
            .all(|p| p["category"]["name"] == json!("filter-wanted")),
    );
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_featured_zero_means_unlimited() {
    let client = client();
    let token = admin_token(&client).await;
    let category = create_category(&client, &token, "featured-cap").await;

    // Three featured products.
    for i in 0..3 {
        let image = reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4E, 0x47])
            .file_name("f.png")
            .mime_str("image/png")
            .expect("valid mime");
        let form = reqwest::multipart::Form::new()
            .text("name", format!("Featured {i}"))
            .text("description", "featured product")
            .text("price", "2.00")
            .text("categoryId", category.to_string())
            .text("countInStock", "5")
            .text("isFeatured", "true")
            .part("image", image);
        let resp = client
            .post(format!("{}/products", api_url()))
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await
            .expect("create product request failed");
        assert!(resp.status().is_success());
    }

    let capped: Value = client
        .get(format!("{}/products/get/featured/2", api_url()))
        .send()
        .await
        .expect("featured request failed")
        .json()
        .await
        .expect("featured not JSON");
    assert!(capped.as_array().expect("array").len() <= 2);

    let unlimited: Value = client
        .get(format!("{}/products/get/featured/0", api_url()))
        .send()
        .await
        .expect("featured request failed")
        .json()
        .await
        .expect("featured not JSON");
    assert!(
        unlimited.as_array().expect("array").len() >= 3,
        "a count of 0 returns every featured product"
    );
}
