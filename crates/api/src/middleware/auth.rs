//! Authentication extractors.
//!
//! Handlers opt into authentication by taking one of these extractors:
//!
//! - [`CurrentUser`] - any valid bearer token (customer or admin)
//! - [`RequireAdmin`] - a valid bearer token carrying the admin role
//! - [`OptionalUser`] - claims when a valid token is present, `None` otherwise
//!
//! Tokens ride in the `Authorization: Bearer <jwt>` header and are verified
//! against the secret from the application configuration.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use bramble_core::Role;

use crate::error::AppError;
use crate::services::auth::{TokenClaims, verify_token};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(claims): CurrentUser) -> impl IntoResponse {
///     format!("user {} acting as {}", claims.user_id(), claims.role)
/// }
/// ```
pub struct CurrentUser(pub TokenClaims);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

        let claims = verify_token(state.config(), token)?;
        Ok(Self(claims))
    }
}

/// Extractor that requires a valid bearer token with the admin role.
///
/// Missing or invalid tokens are rejected with 401; valid non-admin tokens
/// with 403. No handler body runs in either case, so a rejected privileged
/// request cannot change state.
pub struct RequireAdmin(pub TokenClaims);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state).await?;

        if !claims.role.at_least(Role::Admin) {
            return Err(AppError::Forbidden(
                "this route requires the admin role".to_owned(),
            ));
        }

        Ok(Self(claims))
    }
}

/// Extractor that optionally reads the current user's claims.
///
/// Unlike [`CurrentUser`], this never rejects: an absent or invalid token
/// yields `None`.
pub struct OptionalUser(pub Option<TokenClaims>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(parts).and_then(|token| verify_token(state.config(), token).ok());
        Ok(Self(claims))
    }
}

/// Pull the token out of an `Authorization: Bearer ...` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/products");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_present() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let parts = parts_with_auth(None);
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_bearer_token_empty_value() {
        let parts = parts_with_auth(Some("Bearer "));
        assert_eq!(bearer_token(&parts), None);
    }
}
