//! User domain models.
//!
//! The password hash is deliberately absent from [`User`]: it is write-only
//! from the API's perspective and only crosses the repository boundary via
//! dedicated credential methods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bramble_core::{Email, Role, UserId};

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email (unique, lowercased).
    pub email: Email,
    /// Contact phone number.
    pub phone: String,
    /// Authorization role (`customer` or `admin`).
    pub role: Role,
    pub street: String,
    pub apartment: String,
    pub zip: String,
    pub city: String,
    pub country: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Input for public self-registration. The created account is always a
/// `customer`; roles are assigned only through admin user creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub apartment: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

/// Input for admin user creation; may set any role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[serde(flatten)]
    pub register: RegisterInput,
    #[serde(default = "default_role")]
    pub role: Role,
}

/// Input for replacing a user (full-field replace).
///
/// `password` is optional: when present the stored hash is replaced with a
/// hash of the new plaintext; when absent the prior hash is preserved
/// unchanged. `role` is honored only for admin callers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub phone: String,
    pub role: Option<Role>,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub apartment: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

const fn default_role() -> Role {
    Role::Customer
}
