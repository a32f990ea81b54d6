//! Delivery orders and the submission boundary.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;
use crate::geo::Coordinate;
use crate::locations::{LocationCategory, LocationRegistry};

const ORDER_NUMBER_PREFIX: &str = "THU_";
const ORDER_NUMBER_LEN: usize = 9;
const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Waiting for a drone
    #[default]
    Pending,
    /// Drone bound, not yet airborne
    Assigned,
    /// Drone airborne
    Delivering,
    Completed,
}

/// What the submitter sends: two location ids and an optional note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub start_location_id: String,
    #[serde(default)]
    pub end_location_id: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl OrderRequest {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_location_id: start.into(),
            end_location_id: end.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Human-readable reference shown to customers
    pub order_number: String,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub start_point: Coordinate,
    pub end_point: Coordinate,
    pub start_location_name: String,
    pub end_location_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Order {
    /// Validate a submission against the loaded locations and build a pending order.
    pub fn from_request(registry: &LocationRegistry, request: &OrderRequest) -> Result<Self, OrderError> {
        let start_id = request.start_location_id.trim();
        let end_id = request.end_location_id.trim();

        if start_id.is_empty() {
            return Err(OrderError::MissingEndpoint("pickup"));
        }
        if end_id.is_empty() {
            return Err(OrderError::MissingEndpoint("drop-off"));
        }

        let start = registry
            .resolve(start_id)
            .ok_or_else(|| OrderError::UnknownLocation(start_id.to_string()))?;
        let end = registry
            .resolve(end_id)
            .ok_or_else(|| OrderError::UnknownLocation(end_id.to_string()))?;

        if !start.category.is_pickup() {
            return Err(OrderError::InvalidPickup {
                id: start.id.clone(),
                category: start.category,
            });
        }
        if end.category != LocationCategory::Dorm {
            return Err(OrderError::InvalidDropoff {
                id: end.id.clone(),
                category: end.category,
            });
        }

        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(Self {
            id: format!("ORDER-{}", short_id()),
            order_number: generate_order_number(),
            created_at: Utc::now(),
            status: OrderStatus::Pending,
            start_point: start.coordinates,
            end_point: end.coordinates,
            start_location_name: start.name.clone(),
            end_location_name: end.name.clone(),
            description,
        })
    }
}

/// First eight hex digits of a v4 uuid, upper-cased.
pub(crate) fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

fn generate_order_number() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_NUMBER_LEN)
        .map(|_| ORDER_NUMBER_CHARSET[rng.random_range(0..ORDER_NUMBER_CHARSET.len())] as char)
        .collect();
    format!("{ORDER_NUMBER_PREFIX}{suffix}")
}
