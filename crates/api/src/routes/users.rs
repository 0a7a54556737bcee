//! User route handlers: accounts, login, registration.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use bramble_core::{Role, UserId};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, RequireAdmin, auth_rate_limiter};
use crate::models::{CreateUserInput, RegisterInput, UpdateUserInput, User};
use crate::services::AuthService;
use crate::state::AppState;

use super::DeleteResponse;

/// Build the user router. Login and registration sit behind the auth rate
/// limiter.
pub fn router() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/", get(list).post(create))
        .route("/get/count", get(count))
        .route("/{id}", get(show).put(update).delete(remove))
        .merge(limited)
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login response: the account email and a bearer token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: String,
    pub token: String,
}

/// Response for the user count endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCount {
    pub user_count: i64,
}

/// List all users. Password hashes are never part of the model.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}

/// Get one user. Customers may read their own record; admins any.
pub async fn show(
    CurrentUser(claims): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    require_self_or_admin(&claims, id)?;

    let user = UserRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    Ok(Json(user))
}

/// Create a user with an arbitrary role (admin only).
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> Result<Json<User>> {
    let auth = AuthService::new(state.pool(), state.config());
    let user = auth.register(&input.register, input.role).await?;
    Ok(Json(user))
}

/// Public self-registration; the account is always a customer.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<User>> {
    let auth = AuthService::new(state.pool(), state.config());
    let user = auth.register(&input, Role::Customer).await?;
    Ok(Json(user))
}

/// Replace a user's profile. Customers may update their own record (the
/// stored role is preserved); admins may update anyone and change roles.
/// The password hash is replaced only when a new plaintext password is
/// supplied.
pub async fn update(
    CurrentUser(claims): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<User>> {
    require_self_or_admin(&claims, id)?;

    let users = UserRepository::new(state.pool());
    let existing = users
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    // Only admins may change a role; everyone else keeps the stored one.
    let role = if claims.role.is_admin() {
        input.role.unwrap_or(existing.role)
    } else {
        existing.role
    };

    let auth = AuthService::new(state.pool(), state.config());
    let user = auth.update_profile(id, &input, role).await?;
    Ok(Json(user))
}

/// Delete a user account.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<DeleteResponse>> {
    UserRepository::new(state.pool()).delete(id).await?;
    Ok(Json(DeleteResponse::OK))
}

/// Verify credentials and issue a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.pool(), state.config());
    let (user, token) = auth.login(&input.email, &input.password).await?;

    Ok(Json(LoginResponse {
        user: user.email.into_inner(),
        token,
    }))
}

/// Count all registered users.
pub async fn count(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserCount>> {
    let user_count = UserRepository::new(state.pool()).count().await?;
    Ok(Json(UserCount { user_count }))
}

/// Customers may only touch their own record; admins any.
fn require_self_or_admin(
    claims: &crate::services::TokenClaims,
    target: UserId,
) -> Result<()> {
    if claims.role.is_admin() || claims.user_id() == target {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "customers may only access their own account".to_owned(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::services::TokenClaims;

    use super::*;

    fn claims(sub: i32, role: Role) -> TokenClaims {
        TokenClaims {
            sub,
            role,
            iat: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn test_customer_may_access_self() {
        assert!(require_self_or_admin(&claims(7, Role::Customer), UserId::new(7)).is_ok());
    }

    #[test]
    fn test_customer_may_not_access_others() {
        let err = require_self_or_admin(&claims(7, Role::Customer), UserId::new(8)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_admin_may_access_anyone() {
        assert!(require_self_or_admin(&claims(1, Role::Admin), UserId::new(99)).is_ok());
    }
}
