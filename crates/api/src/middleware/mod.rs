//! HTTP middleware and extractors for the API.
//!
//! The authentication gate is expressed as per-handler extractors rather
//! than a blanket layer: public handlers take no extractor (or
//! [`OptionalUser`]), customer routes take [`CurrentUser`], and privileged
//! routes take [`RequireAdmin`]. The route table in [`crate::routes`]
//! documents which routes are reachable anonymously.

pub mod auth;
pub mod rate_limit;

pub use auth::{CurrentUser, OptionalUser, RequireAdmin};
pub use rate_limit::auth_rate_limiter;
