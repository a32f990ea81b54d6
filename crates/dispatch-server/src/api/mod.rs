//! API routes for the dispatch server.

mod error;
pub mod orders;
mod routes;
pub mod simulation;
pub mod ws;

pub use error::ApiError;

use axum::Router;

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
