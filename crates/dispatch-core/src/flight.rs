//! Per-drone flight state machine.
//!
//! A drone is created `assigned`, leaves on its first tick, moves one path
//! point per tick while `delivering`, and stops for good at the last point.

use serde::{Deserialize, Serialize};

use crate::dispatch::FlightAssignment;
use crate::geo::{path_length_m, Coordinate};
use crate::orders::{short_id, Order};

/// Nominal cruise speed reported for every drone.
pub const DEFAULT_SPEED_MPS: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroneStatus {
    /// Bound to an order, waiting for the first tick
    #[default]
    Assigned,
    Delivering,
    /// Terminal
    Completed,
}

/// Transition produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightEvent {
    /// `assigned -> delivering`, no movement this tick
    Departed,
    /// Moved along the path and is still delivering
    Moved { path_index: usize },
    /// Reached the final path point
    Arrived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
    pub id: String,
    pub order_id: String,
    pub status: DroneStatus,
    pub start_position: Coordinate,
    pub target_position: Coordinate,
    pub path: Vec<Coordinate>,
    pub current_position: Coordinate,
    pub path_index: usize,
    pub speed_mps: f64,
    pub altitude_m: f64,
}

impl Drone {
    /// A fresh drone for `order` flying `assignment`.
    pub fn new(order: &Order, assignment: FlightAssignment) -> Self {
        Self {
            id: format!("DRONE-{}", short_id()),
            order_id: order.id.clone(),
            status: DroneStatus::Assigned,
            start_position: order.start_point,
            target_position: order.end_point,
            path: assignment.path,
            current_position: order.start_point,
            path_index: 0,
            speed_mps: DEFAULT_SPEED_MPS,
            altitude_m: assignment.altitude_m,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == DroneStatus::Completed
    }

    /// Apply one clock tick. Completed drones are left untouched.
    pub fn advance(&mut self) -> Option<FlightEvent> {
        match self.status {
            DroneStatus::Assigned => {
                self.status = DroneStatus::Delivering;
                if let Some(first) = self.path.first() {
                    self.current_position = *first;
                }
                Some(FlightEvent::Departed)
            }
            DroneStatus::Delivering => {
                let Some(last) = self.path.len().checked_sub(1) else {
                    // Nothing to fly: already where it is going.
                    self.status = DroneStatus::Completed;
                    return Some(FlightEvent::Arrived);
                };

                self.path_index = (self.path_index + 1).min(last);
                self.current_position = self.path[self.path_index];

                if self.path_index == last {
                    self.status = DroneStatus::Completed;
                    Some(FlightEvent::Arrived)
                } else {
                    Some(FlightEvent::Moved {
                        path_index: self.path_index,
                    })
                }
            }
            DroneStatus::Completed => None,
        }
    }

    /// Flight progress in percent.
    pub fn progress_percent(&self) -> f64 {
        match self.status {
            DroneStatus::Completed => 100.0,
            DroneStatus::Assigned => 0.0,
            DroneStatus::Delivering => {
                if self.path.len() < 2 {
                    return 0.0;
                }
                let progress = self.path_index as f64 / (self.path.len() - 1) as f64 * 100.0;
                progress.clamp(0.0, 100.0)
            }
        }
    }

    /// Distance left along the path, in meters.
    pub fn remaining_distance_m(&self) -> f64 {
        match self.path.get(self.path_index..) {
            Some(rest) if self.status != DroneStatus::Completed => path_length_m(rest),
            _ => 0.0,
        }
    }
}

/// Read-only view of a drone for observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneView {
    #[serde(flatten)]
    pub drone: Drone,
    pub progress_percent: f64,
    pub remaining_distance_m: f64,
}

impl From<&Drone> for DroneView {
    fn from(drone: &Drone) -> Self {
        Self {
            progress_percent: drone.progress_percent(),
            remaining_distance_m: drone.remaining_distance_m(),
            drone: drone.clone(),
        }
    }
}
