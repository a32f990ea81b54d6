//! Dispatch Server - campus drone delivery simulation backend

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatch_server::config::Config;
use dispatch_server::state::AppState;
use dispatch_server::{api, providers};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("dispatch_server=debug".parse()?)
            .add_directive("dispatch_core=info".parse()?))
        .init();

    tracing::info!("Starting Dispatch Server...");

    let config = Config::from_env();
    let port = config.server_port;

    let (registry, catalog) = tokio::join!(
        providers::load_locations(&config.data_dir),
        providers::load_catalog(&config.routes_source, config.catalog_timeout),
    );

    let autostart = config.autostart;
    let state = Arc::new(AppState::new(config, registry, Some(catalog)));
    if autostart {
        state.start_simulation(None).await;
    }

    // Build the app
    let app = api::routes()
        .with_state(state.clone()) // Inject state into all routes
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.stop_simulation().await;
    tracing::info!("Dispatch Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
