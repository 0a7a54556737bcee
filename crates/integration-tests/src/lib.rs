//! Integration tests for Bramble.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and migrate
//! cargo run -p bramble-cli -- migrate
//!
//! # Create the admin account the tests authenticate with
//! cargo run -p bramble-cli -- admin create \
//!     -e admin@bramble.test -n "Test Admin" -p <password> --phone +1-555-0100
//!
//! # Start the API
//! cargo run -p bramble-api
//!
//! # Run the ignored tests
//! cargo test -p bramble-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `BRAMBLE_TEST_BASE_URL` - API base URL (default: `http://localhost:5000`)
//! - `BRAMBLE_TEST_ADMIN_EMAIL` - admin login (default: `admin@bramble.test`)
//! - `BRAMBLE_TEST_ADMIN_PASSWORD` - admin password (default: `bramble-it-2026`)
//!
//! # Test Categories
//!
//! - `catalog` - Category and product CRUD, filters, featured listing
//! - `accounts` - Registration, login, role gating
//! - `orders` - Order placement, pricing, deletion, listing order, aggregates

use reqwest::Client;
use serde_json::Value;

/// Base URL for the API server (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("BRAMBLE_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// Base URL including the API prefix.
#[must_use]
pub fn api_url() -> String {
    format!("{}/api/v1", base_url())
}

/// A plain HTTP client.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// An email address that will not collide across test runs.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before unix epoch")
        .as_nanos();
    format!("{prefix}-{nanos}@bramble.test")
}

/// Log in as the test admin and return a bearer token.
///
/// # Panics
///
/// Panics if the login request fails; the admin account must exist
/// (see the crate docs).
pub async fn admin_token(client: &Client) -> String {
    let email = std::env::var("BRAMBLE_TEST_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@bramble.test".to_string());
    let password = std::env::var("BRAMBLE_TEST_ADMIN_PASSWORD")
        .unwrap_or_else(|_| "bramble-it-2026".to_string());

    login(client, &email, &password).await
}

/// Log in and return a bearer token.
///
/// # Panics
///
/// Panics if the login request fails.
pub async fn login(client: &Client, email: &str, password: &str) -> String {
    let resp = client
        .post(format!("{}/users/login", api_url()))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .expect("login request failed");

    assert!(
        resp.status().is_success(),
        "login failed with status {}",
        resp.status()
    );

    let body: Value = resp.json().await.expect("login response not JSON");
    body["token"]
        .as_str()
        .expect("login response missing token")
        .to_string()
}

/// Create a category via the API and return its id.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn create_category(client: &Client, token: &str, name: &str) -> i64 {
    let resp = client
        .post(format!("{}/categories", api_url()))
        .bearer_auth(token)
        .json(&serde_json::json!({"name": name}))
        .send()
        .await
        .expect("create category request failed");

    assert!(resp.status().is_success(), "create category failed");
    let body: Value = resp.json().await.expect("category response not JSON");
    body["id"].as_i64().expect("category response missing id")
}

/// Create a product via the multipart endpoint and return its id.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn create_product(
    client: &Client,
    token: &str,
    name: &str,
    price: &str,
    category_id: i64,
) -> i64 {
    // A 1x1 PNG so the image MIME check passes.
    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    let image = reqwest::multipart::Part::bytes(PNG.to_vec())
        .file_name("test.png")
        .mime_str("image/png")
        .expect("valid mime");

    let form = reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("description", format!("{name} description"))
        .text("price", price.to_string())
        .text("categoryId", category_id.to_string())
        .text("countInStock", "10")
        .part("image", image);

    let resp = client
        .post(format!("{}/products", api_url()))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("create product request failed");

    assert!(
        resp.status().is_success(),
        "create product failed with status {}",
        resp.status()
    );
    let body: Value = resp.json().await.expect("product response not JSON");
    body["id"].as_i64().expect("product response missing id")
}
