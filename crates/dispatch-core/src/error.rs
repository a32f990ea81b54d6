//! Error types for order intake, dispatch and clock configuration.

use thiserror::Error;

use crate::locations::LocationCategory;

/// Reasons an order submission is rejected. No order is created.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("missing {0} location")]
    MissingEndpoint(&'static str),
    #[error("unknown location '{0}'")]
    UnknownLocation(String),
    #[error("pickup must be a gate or canteen, '{id}' is a {category}")]
    InvalidPickup { id: String, category: LocationCategory },
    #[error("drop-off must be a dorm, '{id}' is a {category}")]
    InvalidDropoff { id: String, category: LocationCategory },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("order {0} not found")]
    UnknownOrder(String),
    #[error("order {order_id} already has drone {drone_id}")]
    AlreadyDispatched { order_id: String, drone_id: String },
    #[error("order {0} is already completed")]
    OrderCompleted(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeedError {
    #[error("speed multiplier must be a finite number greater than zero, got {0}")]
    NotPositive(f64),
    #[error("speed multiplier {value} is below the minimum of {min}")]
    TooSlow { value: f64, min: f64 },
    #[error("speed multiplier {value} exceeds the maximum of {max}")]
    TooFast { value: f64, max: f64 },
}

/// Location data that could not be turned into a registry.
#[derive(Debug, Error)]
pub enum LocationDataError {
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{category} feature {index} has no usable coordinates")]
    MissingCoordinates {
        category: LocationCategory,
        index: usize,
    },
}
