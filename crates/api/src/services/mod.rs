//! Business services for the API.
//!
//! Services own the logic that spans more than one repository call or
//! touches credentials; plain CRUD goes straight from route handler to
//! repository.

pub mod auth;
pub mod orders;

pub use auth::{AuthError, AuthService, TokenClaims};
pub use orders::OrderService;
