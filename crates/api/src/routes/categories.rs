//! Category route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use bramble_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryInput};
use crate::state::AppState;

use super::DeleteResponse;

/// Build the category router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
}

/// List all categories.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// Get one category by id.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;
    Ok(Json(category))
}

/// Create a category.
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    validate(&input)?;
    let category = CategoryRepository::new(state.pool()).create(&input).await?;
    Ok(Json(category))
}

/// Replace a category (full-field replace).
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    validate(&input)?;
    let category = CategoryRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(Json(category))
}

/// Delete a category.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<DeleteResponse>> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    Ok(Json(DeleteResponse::OK))
}

fn validate(input: &CategoryInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("category name is required".to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_name() {
        let input = CategoryInput {
            name: "  ".to_owned(),
            color: String::new(),
            icon: String::new(),
        };
        assert!(validate(&input).is_err());

        let input = CategoryInput {
            name: "garden".to_owned(),
            color: "#2f5d3a".to_owned(),
            icon: "leaf".to_owned(),
        };
        assert!(validate(&input).is_ok());
    }
}
