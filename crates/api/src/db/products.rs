//! Product repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bramble_core::{CategoryId, Money, ProductId};

use super::RepositoryError;
use crate::models::{
    Category, CreateProductInput, Product, ProductWithCategory, UpdateProductInput,
};

const PRODUCT_COLUMNS: &str = r"
    p.id, p.name, p.description, p.rich_description, p.image_url,
    p.gallery_image_urls, p.brand, p.price, p.category_id, p.count_in_stock,
    p.rating, p.num_reviews, p.is_featured, p.created_at
";

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    rich_description: String,
    image_url: String,
    gallery_image_urls: Vec<String>,
    brand: String,
    price: Money,
    category_id: CategoryId,
    count_in_stock: i16,
    rating: f32,
    num_reviews: i32,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            rich_description: row.rich_description,
            image_url: row.image_url,
            gallery_image_urls: row.gallery_image_urls,
            brand: row.brand,
            price: row.price,
            category_id: row.category_id,
            count_in_stock: row.count_in_stock,
            rating: row.rating,
            num_reviews: row.num_reviews,
            is_featured: row.is_featured,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for products joined with their category.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductWithCategoryRow {
    #[sqlx(flatten)]
    pub(super) product: ProductRow,
    pub(super) category_name: String,
    pub(super) category_color: String,
    pub(super) category_icon: String,
}

impl From<ProductWithCategoryRow> for ProductWithCategory {
    fn from(row: ProductWithCategoryRow) -> Self {
        let category = Category {
            id: row.product.category_id,
            name: row.category_name,
            color: row.category_color,
            icon: row.category_icon,
        };
        Self {
            product: row.product.into(),
            category,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products with their category expanded, optionally restricted to
    /// a set of category IDs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        categories: Option<&[CategoryId]>,
    ) -> Result<Vec<ProductWithCategory>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS},
                   c.name AS category_name, c.color AS category_color, c.icon AS category_icon
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE $1::int[] IS NULL OR p.category_id = ANY($1)
            ORDER BY p.id ASC
            "
        );

        let filter: Option<Vec<i32>> =
            categories.map(|ids| ids.iter().map(|id| id.as_i32()).collect());

        let rows = sqlx::query_as::<_, ProductWithCategoryRow>(&sql)
            .bind(filter)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(ProductWithCategory::from).collect())
    }

    /// Get a product by ID with its category expanded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductWithCategory>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS},
                   c.name AS category_name, c.color AS category_color, c.icon AS category_icon
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1
            "
        );

        let row = sqlx::query_as::<_, ProductWithCategoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(ProductWithCategory::from))
    }

    /// Create a new product. The category reference must already be
    /// validated by the caller; a dangling reference still fails on the
    /// foreign key and surfaces as `Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category reference is
    /// dangling, `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        input: &CreateProductInput,
        category_id: CategoryId,
        image_url: &str,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products AS p
                (name, description, rich_description, image_url, brand, price,
                 category_id, count_in_stock, rating, num_reviews, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING p.id, p.name, p.description, p.rich_description, p.image_url,
                      p.gallery_image_urls, p.brand, p.price, p.category_id,
                      p.count_in_stock, p.rating, p.num_reviews, p.is_featured, p.created_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.rich_description)
        .bind(image_url)
        .bind(&input.brand)
        .bind(input.price)
        .bind(category_id)
        .bind(input.count_in_stock)
        .bind(input.rating)
        .bind(input.num_reviews)
        .bind(input.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(foreign_key_to_conflict)?;

        Ok(row.into())
    }

    /// Replace a product's fields (full-field replace).
    ///
    /// The category reference is not re-checked against the categories table
    /// here; only the foreign key guards against ids that never existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the category reference is dangling.
    pub async fn update(
        &self,
        id: ProductId,
        input: &UpdateProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products AS p
            SET name = $2, description = $3, rich_description = $4, image_url = $5,
                brand = $6, price = $7, category_id = $8, count_in_stock = $9,
                rating = $10, num_reviews = $11, is_featured = $12
            WHERE id = $1
            RETURNING p.id, p.name, p.description, p.rich_description, p.image_url,
                      p.gallery_image_urls, p.brand, p.price, p.category_id,
                      p.count_in_stock, p.rating, p.num_reviews, p.is_featured, p.created_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.rich_description)
        .bind(&input.image_url)
        .bind(&input.brand)
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.count_in_stock)
        .bind(input.rating)
        .bind(input.num_reviews)
        .bind(input.is_featured)
        .fetch_optional(self.pool)
        .await
        .map_err(foreign_key_to_conflict)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Replace a product's gallery image URL list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update_gallery(
        &self,
        id: ProductId,
        image_urls: &[String],
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products AS p
            SET gallery_image_urls = $2
            WHERE id = $1
            RETURNING p.id, p.name, p.description, p.rich_description, p.image_url,
                      p.gallery_image_urls, p.brand, p.price, p.category_id,
                      p.count_in_stock, p.rating, p.num_reviews, p.is_featured, p.created_at
            ",
        )
        .bind(id)
        .bind(image_urls)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if order items still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM products WHERE id = $1
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict(
                    "product is still referenced by order items".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM products
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// List featured products, capped at `limit`. A limit of 0 means no cap.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.name, p.description, p.rich_description, p.image_url,
                   p.gallery_image_urls, p.brand, p.price, p.category_id,
                   p.count_in_stock, p.rating, p.num_reviews, p.is_featured, p.created_at
            FROM products p
            WHERE p.is_featured
            ORDER BY p.id ASC
            LIMIT NULLIF($1, 0)
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}

/// Map a foreign-key violation on `category_id` to a `Conflict`.
fn foreign_key_to_conflict(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict("category reference does not exist".to_owned());
    }
    RepositoryError::Database(e)
}
