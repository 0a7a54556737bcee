//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every failure answers with the same JSON
//! envelope: `{"error": "<kind>", "message": "<text>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request payload failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller presented no valid credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::uploads::UploadError> for AppError {
    fn from(err: crate::uploads::UploadError) -> Self {
        use crate::uploads::UploadError;
        match err {
            UploadError::UnsupportedType(_)
            | UploadError::MissingFile
            | UploadError::TooManyFiles => Self::Validation(err.to_string()),
            UploadError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyCart | OrderError::InvalidQuantity(_) => {
                Self::Validation(err.to_string())
            }
            OrderError::UnknownProduct(msg) => Self::Validation(msg),
            OrderError::Repository(e) => Self::Repository(e),
        }
    }
}

/// The uniform error envelope returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable kind: `validation`, `unauthorized`,
    /// `forbidden`, `not_found`, `conflict`, or `internal`.
    pub error: &'static str,
    /// Human-readable explanation.
    pub message: String,
}

impl AppError {
    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Repository(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                AuthError::Repository(_) | AuthError::TokenCreation | AuthError::Hash(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The stable `error` field of the envelope.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.status().as_u16() {
            400 => "validation",
            401 => "unauthorized",
            403 => "forbidden",
            404 => "not_found",
            409 => "conflict",
            _ => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            match &self {
                Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
                Self::Auth(AuthError::EmailTaken) => {
                    "An account with this email already exists".to_string()
                }
                other => other.to_string(),
            }
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::Validation("quantity must be positive".to_string());
        assert_eq!(err.to_string(), "Validation error: quantity must be positive");
    }

    #[test]
    fn test_status_codes_are_normalized() {
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Repository(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Repository(RepositoryError::Conflict("email".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_kind_matches_status() {
        assert_eq!(AppError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(AppError::Validation("x".into()).kind(), "validation");
        assert_eq!(AppError::Unauthorized("x".into()).kind(), "unauthorized");
        assert_eq!(AppError::Forbidden("x".into()).kind(), "forbidden");
        assert_eq!(AppError::Internal("x".into()).kind(), "internal");
    }

    #[test]
    fn test_internal_details_hidden() {
        let response = AppError::Internal("connection pool exhausted".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bad_cart_maps_to_validation() {
        let err: AppError = OrderError::EmptyCart.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = OrderError::UnknownProduct("cart references unknown product 9".into())
            .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = OrderError::Repository(RepositoryError::NotFound).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::EmailTaken).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth(AuthError::WeakPassword("too short".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
