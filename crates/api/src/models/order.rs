//! Order domain models.
//!
//! An order owns its line items: they are created together in one
//! transaction and destroyed together. `total_price` is computed once at
//! creation from the referenced products' prices at that moment and never
//! recomputed afterwards, even if a product's price later changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bramble_core::{Money, OrderId, OrderItemId, ProductId, UserId};

use super::ProductWithCategory;

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// IDs of the owned line items, in submission order.
    pub line_item_ids: Vec<OrderItemId>,
    /// First shipping address line.
    pub shipping_address1: String,
    /// Second shipping address line.
    pub shipping_address2: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    /// Free-form status string (e.g. `pending`, `shipped`).
    pub status: String,
    /// Snapshot total: Σ quantity × unit price at creation time.
    pub total_price: Money,
    /// The user who placed the order, if known.
    pub user_id: Option<UserId>,
    /// When the order was placed.
    pub ordered_at: DateTime<Utc>,
}

/// An order as returned by the listing endpoint: the user reference is
/// resolved to a display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    /// Display name of the ordering user, if the order has one.
    pub user_name: Option<String>,
}

/// A fully expanded order: line items carry their product, and each product
/// carries its category (two levels of reference expansion).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: OrderId,
    /// Owned line items in submission order, fully expanded.
    pub line_items: Vec<OrderItemDetail>,
    pub shipping_address1: String,
    pub shipping_address2: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub status: String,
    pub total_price: Money,
    /// The ordering user, resolved to id + display name.
    pub user: Option<OrderUser>,
    pub ordered_at: DateTime<Utc>,
}

/// A line item expanded with its product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetail {
    /// Unique line item ID.
    pub id: OrderItemId,
    /// Quantity ordered.
    pub quantity: i32,
    /// The referenced product with its category expanded.
    pub product: ProductWithCategory,
}

/// The resolved user reference on an expanded order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUser {
    pub id: UserId,
    pub name: String,
}

/// One submitted cart entry.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// The product being ordered.
    pub product_id: ProductId,
    /// Units of the product (must be > 0).
    pub quantity: i32,
}

/// Input for placing an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    /// The submitted cart; order is preserved.
    pub order_items: Vec<CartEntry>,
    pub shipping_address1: String,
    #[serde(default)]
    pub shipping_address2: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    /// Accepted as supplied; defaults to `pending`.
    #[serde(default = "default_status")]
    pub status: String,
    /// The ordering user, if authenticated or supplied.
    pub user_id: Option<UserId>,
}

/// Input for replacing an order's status. Every other field is untouched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusInput {
    pub status: String,
}

fn default_status() -> String {
    "pending".to_string()
}
