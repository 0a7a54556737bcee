//! Product route handlers, including multipart image uploads.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    routing::{get, put},
};
use serde::{Deserialize, Serialize};

use bramble_core::{CategoryId, Money, ProductId};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{CreateProductInput, Product, ProductWithCategory, UpdateProductInput};
use crate::state::AppState;
use crate::uploads::{ImageStore, MAX_GALLERY_IMAGES, UploadError};

use super::DeleteResponse;

/// Build the product router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/get/count", get(count))
        .route("/get/featured/{count}", get(featured))
        .route("/gallery-images/{id}", put(update_gallery))
        .route("/{id}", get(show).put(update).delete(remove))
}

/// Query parameters for product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated category ids; absent means no filter.
    pub categories: Option<String>,
}

/// Response for the product count endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCount {
    pub product_count: i64,
}

/// List products, optionally restricted to a comma-separated set of
/// category ids.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductWithCategory>>> {
    let filter = query
        .categories
        .as_deref()
        .map(parse_category_filter)
        .transpose()?;

    let products = ProductRepository::new(state.pool())
        .list(filter.as_deref())
        .await?;
    Ok(Json(products))
}

/// Get one product by id, category expanded.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductWithCategory>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}

/// Create a product from a multipart request carrying the scalar fields and
/// one `image` file. The category must exist; otherwise nothing is
/// persisted.
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Product>> {
    let (input, image) = read_product_form(multipart).await?;
    validate_input(&input.name, &input.description, input.price, input.count_in_stock)?;

    let category_id = input
        .category_id
        .ok_or_else(|| AppError::Validation("categoryId is required".to_owned()))?;

    // Reference must resolve before anything is written.
    let categories = CategoryRepository::new(state.pool());
    if !categories.exists(category_id).await? {
        return Err(AppError::Validation(format!(
            "category {category_id} does not exist"
        )));
    }

    let image = image.ok_or(UploadError::MissingFile)?;
    let image_url = ImageStore::new(state.config())
        .save(&image.file_name, &image.content_type, &image.bytes)
        .await?;

    let product = ProductRepository::new(state.pool())
        .create(&input, category_id, &image_url)
        .await?;
    Ok(Json(product))
}

/// Replace a product (full-field replace, JSON body).
///
/// The category reference is deliberately not re-checked here; see the
/// repository notes.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<Product>> {
    validate_input(&input.name, &input.description, input.price, input.count_in_stock)?;

    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(Json(product))
}

/// Replace a product's gallery with up to ten uploaded images.
pub async fn update_gallery(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    mut multipart: Multipart,
) -> Result<Json<Product>> {
    let store = ImageStore::new(state.config());
    let mut image_urls = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some("images") {
            continue;
        }
        if image_urls.len() >= MAX_GALLERY_IMAGES {
            return Err(UploadError::TooManyFiles.into());
        }

        let file = read_file(field).await?;
        let url = store
            .save(&file.file_name, &file.content_type, &file.bytes)
            .await?;
        image_urls.push(url);
    }

    let product = ProductRepository::new(state.pool())
        .update_gallery(id, &image_urls)
        .await?;
    Ok(Json(product))
}

/// Delete a product.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<DeleteResponse>> {
    ProductRepository::new(state.pool()).delete(id).await?;
    Ok(Json(DeleteResponse::OK))
}

/// Count all products.
pub async fn count(State(state): State<AppState>) -> Result<Json<ProductCount>> {
    let product_count = ProductRepository::new(state.pool()).count().await?;
    Ok(Json(ProductCount { product_count }))
}

/// List featured products. A count of 0 means unlimited.
pub async fn featured(
    State(state): State<AppState>,
    Path(count): Path<i64>,
) -> Result<Json<Vec<Product>>> {
    if count < 0 {
        return Err(AppError::Validation(
            "featured count cannot be negative".to_owned(),
        ));
    }

    let products = ProductRepository::new(state.pool()).featured(count).await?;
    Ok(Json(products))
}

// =============================================================================
// Multipart parsing
// =============================================================================

/// One uploaded file pulled out of a multipart field.
struct UploadedFile {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

async fn read_file(field: axum::extract::multipart::Field<'_>) -> Result<UploadedFile> {
    let file_name = field.file_name().unwrap_or("image").to_owned();
    let content_type = field.content_type().unwrap_or_default().to_owned();
    let bytes = field.bytes().await.map_err(bad_multipart)?;
    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
    })
}

/// Walk the multipart fields of a product-creation request, collecting the
/// scalar fields and the `image` file.
async fn read_product_form(
    mut multipart: Multipart,
) -> Result<(CreateProductInput, Option<UploadedFile>)> {
    let mut input = CreateProductInput::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == "image" {
            image = Some(read_file(field).await?);
        } else {
            let value = field.text().await.map_err(bad_multipart)?;
            apply_field(&mut input, &name, &value)?;
        }
    }

    Ok((input, image))
}

/// Apply one text field of the product form. Unknown fields are ignored.
fn apply_field(input: &mut CreateProductInput, name: &str, value: &str) -> Result<()> {
    match name {
        "name" => input.name = value.to_owned(),
        "description" => input.description = value.to_owned(),
        "richDescription" => input.rich_description = value.to_owned(),
        "brand" => input.brand = value.to_owned(),
        "price" => input.price = parse_field(name, value)?,
        "categoryId" => input.category_id = Some(CategoryId::new(parse_field(name, value)?)),
        "countInStock" => input.count_in_stock = parse_field(name, value)?,
        "rating" => input.rating = parse_field(name, value)?,
        "numReviews" => input.num_reviews = parse_field(name, value)?,
        "isFeatured" => input.is_featured = parse_field(name, value)?,
        _ => {}
    }
    Ok(())
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::Validation(format!("invalid value for {name}")))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("malformed multipart request: {err}"))
}

// =============================================================================
// Validation
// =============================================================================

/// Shared field validation for create and update.
fn validate_input(
    name: &str,
    description: &str,
    price: rust_decimal::Decimal,
    count_in_stock: i16,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("product name is required".to_owned()));
    }
    if description.trim().is_empty() {
        return Err(AppError::Validation(
            "product description is required".to_owned(),
        ));
    }
    Money::new(price).map_err(|e| AppError::Validation(e.to_string()))?;
    if !(0..=255).contains(&count_in_stock) {
        return Err(AppError::Validation(
            "countInStock must be between 0 and 255".to_owned(),
        ));
    }
    Ok(())
}

/// Parse a `?categories=1,2,3` filter into category ids.
fn parse_category_filter(raw: &str) -> Result<Vec<CategoryId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<CategoryId>()
                .map_err(|_| AppError::Validation(format!("invalid category id: {part}")))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_parse_category_filter() {
        let ids = parse_category_filter("1,2, 3").unwrap();
        assert_eq!(
            ids,
            vec![CategoryId::new(1), CategoryId::new(2), CategoryId::new(3)]
        );
    }

    #[test]
    fn test_parse_category_filter_rejects_garbage() {
        assert!(parse_category_filter("1,abc").is_err());
    }

    #[test]
    fn test_parse_category_filter_skips_empty_parts() {
        let ids = parse_category_filter("1,,2,").unwrap();
        assert_eq!(ids, vec![CategoryId::new(1), CategoryId::new(2)]);
    }

    #[test]
    fn test_validate_input_bounds() {
        let price = Decimal::new(999, 2);
        assert!(validate_input("Hat", "A hat", price, 0).is_ok());
        assert!(validate_input("Hat", "A hat", price, 255).is_ok());
        assert!(validate_input("Hat", "A hat", price, -1).is_err());
        assert!(validate_input("", "A hat", price, 10).is_err());
        assert!(validate_input("Hat", " ", price, 10).is_err());
        assert!(validate_input("Hat", "A hat", Decimal::new(-1, 2), 10).is_err());
    }

    #[test]
    fn test_apply_field_parses_scalars() {
        let mut input = CreateProductInput::default();
        apply_field(&mut input, "name", "Sun Hat").unwrap();
        apply_field(&mut input, "price", "19.99").unwrap();
        apply_field(&mut input, "categoryId", "4").unwrap();
        apply_field(&mut input, "countInStock", "25").unwrap();
        apply_field(&mut input, "isFeatured", "true").unwrap();

        assert_eq!(input.name, "Sun Hat");
        assert_eq!(input.price, Decimal::new(1999, 2));
        assert_eq!(input.category_id, Some(CategoryId::new(4)));
        assert_eq!(input.count_in_stock, 25);
        assert!(input.is_featured);
    }

    #[test]
    fn test_apply_field_rejects_bad_numbers() {
        let mut input = CreateProductInput::default();
        assert!(apply_field(&mut input, "price", "ten dollars").is_err());
        assert!(apply_field(&mut input, "countInStock", "many").is_err());
    }

    #[test]
    fn test_apply_field_ignores_unknown() {
        let mut input = CreateProductInput::default();
        assert!(apply_field(&mut input, "color", "red").is_ok());
    }
}
