//! Startup loaders for location and route catalog data.
//!
//! Neither loader fails: missing or broken data is logged and replaced by
//! the built-in location set or an empty catalog.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use dispatch_core::{LocationRegistry, RouteCatalog};

pub const GATES_FILE: &str = "gates.geojson";
pub const CANTEENS_FILE: &str = "canteens.geojson";
pub const DORMS_FILE: &str = "dorms_sorted.geojson";

/// Load campus locations from `data_dir`, or fall back to the built-in set.
pub async fn load_locations(data_dir: &Path) -> LocationRegistry {
    match read_locations(data_dir).await {
        Ok(registry) => {
            tracing::info!(
                gates = registry.gates.len(),
                canteens = registry.canteens.len(),
                dorms = registry.dorms.len(),
                "Loaded location data from {}",
                data_dir.display()
            );
            registry
        }
        Err(err) => {
            tracing::warn!("Location data unavailable ({:#}), using built-in locations", err);
            LocationRegistry::builtin()
        }
    }
}

async fn read_locations(data_dir: &Path) -> Result<LocationRegistry> {
    let gates = read_file(&data_dir.join(GATES_FILE)).await?;
    let canteens = read_file(&data_dir.join(CANTEENS_FILE)).await?;
    let dorms = read_file(&data_dir.join(DORMS_FILE)).await?;

    let registry = LocationRegistry::from_geojson(&gates, &canteens, &dorms)?;
    anyhow::ensure!(!registry.is_empty(), "location files contain no features");
    Ok(registry)
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

/// Load the route catalog within `timeout`, or fall back to an empty catalog.
pub async fn load_catalog(source: &str, timeout: Duration) -> RouteCatalog {
    match tokio::time::timeout(timeout, fetch_catalog(source)).await {
        Ok(Ok(catalog)) => {
            let stats = catalog.stats();
            for category in &stats.categories {
                tracing::info!(
                    category = %category.name,
                    routes = category.route_count,
                    "Loaded route category"
                );
            }
            tracing::info!(total = stats.total_routes, "Route catalog loaded from {}", source);
            catalog
        }
        Ok(Err(err)) => {
            tracing::warn!("Route catalog unavailable ({:#}), using empty catalog", err);
            RouteCatalog::empty()
        }
        Err(_) => {
            tracing::warn!(
                "Route catalog load from {} timed out after {:?}, using empty catalog",
                source,
                timeout
            );
            RouteCatalog::empty()
        }
    }
}

async fn fetch_catalog(source: &str) -> Result<RouteCatalog> {
    let body = if source.starts_with("http://") || source.starts_with("https://") {
        reqwest::get(source)
            .await
            .with_context(|| format!("requesting {}", source))?
            .error_for_status()?
            .text()
            .await?
    } else {
        read_file(Path::new(source)).await?
    };

    RouteCatalog::from_json(&body).context("parsing route catalog")
}
