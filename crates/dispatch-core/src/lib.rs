pub mod catalog;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod flight;
pub mod geo;
pub mod locations;
pub mod orders;
pub mod simulation;

pub use catalog::{CatalogStats, Route, RouteCatalog, RouteEndpoint, RouteMatch};
pub use clock::{
    SpeedMultiplier, BASE_TICK_INTERVAL, MAX_SPEED_MULTIPLIER, MIN_SPEED_MULTIPLIER, SPEED_PRESETS,
};
pub use dispatch::{dispatch, synthesize_path, FlightAssignment, RouteSource, DEFAULT_ALTITUDE_M};
pub use error::{DispatchError, LocationDataError, OrderError, SpeedError};
pub use flight::{Drone, DroneStatus, DroneView, FlightEvent};
pub use geo::{haversine_distance, is_near, Coordinate};
pub use locations::{Location, LocationCategory, LocationRegistry};
pub use orders::{Order, OrderRequest, OrderStatus};
pub use simulation::{Simulation, SimulationSnapshot, TickReport};
