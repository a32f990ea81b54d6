//! REST API routes.

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;

use crate::api::{orders, simulation, ws};
use crate::state::AppState;
use dispatch_core::{CatalogStats, Drone, LocationRegistry, RouteCatalog, SimulationSnapshot};

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/locations", get(list_locations))
        .route("/v1/routes/stats", get(route_stats))
        .route("/v1/orders", post(orders::create_order).get(orders::list_orders))
        .route("/v1/orders/:order_id", get(orders::get_order))
        .route("/v1/orders/:order_id/dispatch", post(orders::dispatch_order))
        .route("/v1/drones", get(list_drones))
        .route("/v1/snapshot", get(get_snapshot))
        .route("/v1/simulation/start", post(simulation::start))
        .route("/v1/simulation/stop", post(simulation::stop))
        .route("/v1/simulation/reset", post(simulation::reset))
        .route("/v1/simulation/speed", put(simulation::set_speed))
        // WebSocket streaming
        .route("/v1/stream", get(ws::ws_handler))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let config = state.config();
    Json(serde_json::json!({
        "status": "ok",
        "tick_base_ms": config.tick_base.as_millis() as u64,
        "routes_source": config.routes_source,
        "clock_running": state.clock_running().await,
    }))
}

async fn list_locations(State(state): State<Arc<AppState>>) -> Json<LocationRegistry> {
    Json(state.locations())
}

async fn route_stats(State(state): State<Arc<AppState>>) -> Json<CatalogStats> {
    let stats = state.with_sim(|sim| sim.catalog().map(RouteCatalog::stats));
    Json(stats.unwrap_or_else(|| RouteCatalog::empty().stats()))
}

async fn list_drones(State(state): State<Arc<AppState>>) -> Json<Vec<Drone>> {
    Json(state.get_drones())
}

async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<SimulationSnapshot> {
    Json(state.snapshot())
}
