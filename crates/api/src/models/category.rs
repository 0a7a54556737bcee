//! Category domain model.

use serde::{Deserialize, Serialize};

use bramble_core::CategoryId;

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Display color for the frontend (e.g. `#55879a`).
    pub color: String,
    /// Icon identifier for the frontend.
    pub icon: String,
}

/// Input for creating or replacing a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}
