//! Order route handlers.
//!
//! Order reads and creation are public (guest checkout); status updates and
//! deletion are admin operations.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;

use bramble_core::{Money, OrderId, UserId};

use crate::error::{AppError, Result};
use crate::middleware::{OptionalUser, RequireAdmin};
use crate::models::{CreateOrderInput, Order, OrderDetail, OrderSummary, UpdateOrderStatusInput};
use crate::services::OrderService;
use crate::state::AppState;

use super::DeleteResponse;

/// Build the order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/get/totalsales", get(total_sales))
        .route("/get/count", get(count))
        .route("/get/userorders/{user_id}", get(by_user))
        .route("/{id}", get(show).put(update_status).delete(remove))
}

/// Response for the total sales aggregate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSales {
    pub total_sales: Money,
}

/// Response for the order count endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCount {
    pub order_count: i64,
}

/// List all orders, newest first, with user names resolved.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderService::new(state.pool()).list().await?;
    Ok(Json(orders))
}

/// Get one order with line items expanded through product to category.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = OrderService::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    Ok(Json(order))
}

/// Place an order. When the request body names no user, an authenticated
/// caller's id is attached; anonymous guest checkout stays possible.
pub async fn create(
    OptionalUser(claims): OptionalUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateOrderInput>,
) -> Result<Json<Order>> {
    if input.user_id.is_none() {
        input.user_id = claims.map(|c| c.user_id());
    }

    let order = OrderService::new(state.pool()).place(&input).await?;
    Ok(Json(order))
}

/// Replace only the status of an order.
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(input): Json<UpdateOrderStatusInput>,
) -> Result<Json<Order>> {
    if input.status.trim().is_empty() {
        return Err(AppError::Validation("status is required".to_owned()));
    }

    let order = OrderService::new(state.pool())
        .update_status(id, &input.status)
        .await?;
    Ok(Json(order))
}

/// Delete an order and every line item it owns.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<DeleteResponse>> {
    OrderService::new(state.pool()).delete(id).await?;
    Ok(Json(DeleteResponse::OK))
}

/// Sum of all order totals. Zero orders reports 0, not an error.
pub async fn total_sales(State(state): State<AppState>) -> Result<Json<TotalSales>> {
    let total = OrderService::new(state.pool()).total_sales().await?;
    Ok(Json(TotalSales { total_sales: total }))
}

/// Count all orders.
pub async fn count(State(state): State<AppState>) -> Result<Json<OrderCount>> {
    let order_count = OrderService::new(state.pool()).count().await?;
    Ok(Json(OrderCount { order_count }))
}

/// One user's order history, newest first, fully expanded.
pub async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<OrderDetail>>> {
    let orders = OrderService::new(state.pool()).by_user(user_id).await?;
    Ok(Json(orders))
}
