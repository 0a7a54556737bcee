//! Product domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bramble_core::{CategoryId, Money, ProductId};

use super::Category;

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Short description shown in listings.
    pub description: String,
    /// Long-form description shown on the detail page.
    pub rich_description: String,
    /// Absolute URL of the primary image.
    pub image_url: String,
    /// Absolute URLs of the gallery images, in upload order.
    pub gallery_image_urls: Vec<String>,
    /// Brand name.
    pub brand: String,
    /// Unit price.
    pub price: Money,
    /// Owning category. Validated to exist at creation time.
    pub category_id: CategoryId,
    /// Units in stock (0-255).
    pub count_in_stock: i16,
    /// Average review rating.
    pub rating: f32,
    /// Number of reviews behind the rating.
    pub num_reviews: i32,
    /// Whether the product is featured on the home page.
    pub is_featured: bool,
    /// When the product was added to the catalog.
    pub created_at: DateTime<Utc>,
}

/// A product with its category reference expanded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,
    /// The category the product belongs to.
    pub category: Category,
}

/// Input for creating a product.
///
/// Arrives as multipart form fields alongside the primary image file; the
/// route handler parses the text fields into this struct. The image URL is
/// derived from the uploaded file, never taken from the client.
#[derive(Debug, Clone, Default)]
pub struct CreateProductInput {
    pub name: String,
    pub description: String,
    pub rich_description: String,
    pub brand: String,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
    pub count_in_stock: i16,
    pub rating: f32,
    pub num_reviews: i32,
    pub is_featured: bool,
}

/// Input for replacing a product (JSON, full-field replace).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub rich_description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub brand: String,
    pub price: Decimal,
    pub category_id: CategoryId,
    pub count_in_stock: i16,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub num_reviews: i32,
    #[serde(default)]
    pub is_featured: bool,
}
