//! Simulation control: start, stop, speed and reset.

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::ApiError;
use crate::state::AppState;
use dispatch_core::{SimulationSnapshot, SpeedMultiplier};

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Optional speed multiplier to start with
    pub speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: f64,
}

/// POST /v1/simulation/start
pub async fn start(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartRequest>>,
) -> Result<Json<SimulationSnapshot>, ApiError> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let speed = request.speed.map(SpeedMultiplier::new).transpose()?;
    Ok(Json(state.start_simulation(speed).await))
}

/// POST /v1/simulation/stop
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<SimulationSnapshot> {
    Json(state.stop_simulation().await)
}

/// PUT /v1/simulation/speed
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeedRequest>,
) -> Result<Json<SimulationSnapshot>, ApiError> {
    let speed = SpeedMultiplier::new(request.speed)?;
    Ok(Json(state.set_speed(speed).await))
}

/// POST /v1/simulation/reset
pub async fn reset(State(state): State<Arc<AppState>>) -> Json<SimulationSnapshot> {
    Json(state.reset().await)
}
