//! Server configuration from environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dispatch_core::{SpeedMultiplier, BASE_TICK_INTERVAL};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Directory holding gates/canteens/dorms GeoJSON
    pub data_dir: PathBuf,
    /// Route catalog file path or http(s) URL
    pub routes_source: String,
    /// Budget for loading the route catalog
    pub catalog_timeout: Duration,
    /// Tick period at 1x
    pub tick_base: Duration,
    pub initial_speed: SpeedMultiplier,
    /// Start the simulation as soon as the server is up
    pub autostart: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            data_dir: PathBuf::from("data"),
            routes_source: "data/route_planning_results.json".to_string(),
            catalog_timeout: Duration::from_secs(30),
            tick_base: BASE_TICK_INTERVAL,
            initial_speed: SpeedMultiplier::REAL_TIME,
            autostart: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: env::var("DISPATCH_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.server_port),
            data_dir: env::var("DISPATCH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            routes_source: env::var("DISPATCH_ROUTES_SOURCE").unwrap_or(defaults.routes_source),
            catalog_timeout: env::var("DISPATCH_CATALOG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.catalog_timeout),
            tick_base: env::var("DISPATCH_TICK_BASE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_base),
            initial_speed: env::var("DISPATCH_SPEED")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .and_then(|v| SpeedMultiplier::new(v).ok())
                .unwrap_or(defaults.initial_speed),
            autostart: env::var("DISPATCH_AUTOSTART")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.autostart),
        }
    }
}
