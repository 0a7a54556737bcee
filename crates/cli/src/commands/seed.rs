//! Seed the database with sample catalog data.
//!
//! Inserts a handful of categories and products so a fresh install has
//! something to browse. Safe to run repeatedly; it creates new rows each
//! time rather than upserting, so use it on scratch databases only.

use rust_decimal::Decimal;

use bramble_api::db::{CategoryRepository, ProductRepository};
use bramble_api::models::{CategoryInput, CreateProductInput};

use super::CommandError;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    brand: &'static str,
    price_cents: i64,
    count_in_stock: i16,
    is_featured: bool,
}

const SEED_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Garden", "#2f5d3a", "leaf"),
    ("Kitchen", "#b5541c", "pot"),
    ("Outdoors", "#1c5a8d", "tent"),
];

const SEED_PRODUCTS: &[(usize, SeedProduct)] = &[
    (
        0,
        SeedProduct {
            name: "Cedar Planter Box",
            description: "A weather-resistant cedar planter for herbs and flowers.",
            brand: "Bramble",
            price_cents: 4500,
            count_in_stock: 24,
            is_featured: true,
        },
    ),
    (
        1,
        SeedProduct {
            name: "Cast Iron Skillet",
            description: "Pre-seasoned 10-inch skillet.",
            brand: "Hearthline",
            price_cents: 3299,
            count_in_stock: 50,
            is_featured: true,
        },
    ),
    (
        2,
        SeedProduct {
            name: "Two-Person Tent",
            description: "Lightweight three-season tent with aluminum poles.",
            brand: "Northtrail",
            price_cents: 12900,
            count_in_stock: 12,
            is_featured: false,
        },
    ),
];

/// Seed sample categories and products.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    let mut category_ids = Vec::with_capacity(SEED_CATEGORIES.len());
    for (name, color, icon) in SEED_CATEGORIES {
        let category = categories
            .create(&CategoryInput {
                name: (*name).to_owned(),
                color: (*color).to_owned(),
                icon: (*icon).to_owned(),
            })
            .await?;
        tracing::info!(id = %category.id, name = %category.name, "Seeded category");
        category_ids.push(category.id);
    }

    for (category_index, seed) in SEED_PRODUCTS {
        let Some(category_id) = category_ids.get(*category_index).copied() else {
            continue;
        };

        let input = CreateProductInput {
            name: seed.name.to_owned(),
            description: seed.description.to_owned(),
            rich_description: String::new(),
            brand: seed.brand.to_owned(),
            price: Decimal::new(seed.price_cents, 2),
            category_id: Some(category_id),
            count_in_stock: seed.count_in_stock,
            rating: 0.0,
            num_reviews: 0,
            is_featured: seed.is_featured,
        };

        let product = products.create(&input, category_id, "").await?;
        tracing::info!(id = %product.id, name = %product.name, "Seeded product");
    }

    tracing::info!("Seeding complete!");
    Ok(())
}
