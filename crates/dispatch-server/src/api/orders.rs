//! Order intake and manual dispatch endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::ApiError;
use crate::state::AppState;
use dispatch_core::{Drone, Order, OrderRequest};

/// Submit a new order.
/// POST /v1/orders
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    match state.submit_order(&request) {
        Ok(order) => Ok((StatusCode::CREATED, Json(order))),
        Err(err) => {
            tracing::info!(
                start = %request.start_location_id,
                end = %request.end_location_id,
                "Rejected order: {}",
                err
            );
            Err(err.into())
        }
    }
}

/// GET /v1/orders
pub async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(state.get_orders())
}

/// GET /v1/orders/:order_id
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    state
        .get_order(&order_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("order {} not found", order_id)))
}

/// Bind a drone to a pending order without waiting for a start.
/// POST /v1/orders/:order_id/dispatch
pub async fn dispatch_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<(StatusCode, Json<Drone>), ApiError> {
    let drone = state.dispatch_order(&order_id)?;
    Ok((StatusCode::CREATED, Json(drone)))
}
