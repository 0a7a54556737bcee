//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! Roles: `-` reachable anonymously, `C` customer token, `A` admin token.
//!
//! ```text
//! # Categories
//! GET    /categories                      - List categories            [-]
//! GET    /categories/{id}                 - Category by id             [-]
//! POST   /categories                      - Create category            [A]
//! PUT    /categories/{id}                 - Replace category           [A]
//! DELETE /categories/{id}                 - Delete category            [A]
//!
//! # Products
//! GET    /products[?categories=1,2]       - List (optional filter)     [-]
//! GET    /products/{id}                   - Product by id              [-]
//! GET    /products/get/count              - Catalog size               [-]
//! GET    /products/get/featured/{count}   - Featured (0 = no cap)      [-]
//! POST   /products                        - Create (multipart, image)  [A]
//! PUT    /products/{id}                   - Replace product            [A]
//! PUT    /products/gallery-images/{id}    - Replace gallery (<=10)     [A]
//! DELETE /products/{id}                   - Delete product             [A]
//!
//! # Users
//! POST   /users/login                     - Login, returns token       [-]
//! POST   /users/register                  - Self-registration          [-]
//! GET    /users                           - List users                 [A]
//! GET    /users/get/count                 - Registered user count      [A]
//! GET    /users/{id}                      - User by id                 [C: self, A: any]
//! PUT    /users/{id}                      - Replace user               [C: self, A: any]
//! POST   /users                           - Create user (any role)     [A]
//! DELETE /users/{id}                      - Delete user                [A]
//!
//! # Orders
//! GET    /orders                          - List, newest first         [-]
//! GET    /orders/{id}                     - Expanded order             [-]
//! GET    /orders/get/totalsales           - Σ totalPrice (0 if none)   [-]
//! GET    /orders/get/count                - Order count                [-]
//! GET    /orders/get/userorders/{userId}  - Per-user history           [-]
//! POST   /orders                          - Place order                [-]
//! PUT    /orders/{id}                     - Replace status only        [A]
//! DELETE /orders/{id}                     - Delete order + line items  [A]
//! ```

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Response body for successful deletions.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

impl DeleteResponse {
    pub(crate) const OK: Self = Self { success: true };
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/users", users::router())
        .nest("/orders", orders::router())
}
