//! The delivery simulation: orders, drones and the tick that moves them.
//!
//! `Simulation` is the composing layer around the pure dispatch matcher and
//! the per-drone state machine. It owns every order and drone, guarantees at
//! most one drone per order, and applies each tick as a unit.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::RouteCatalog;
use crate::clock::SpeedMultiplier;
use crate::dispatch::dispatch;
use crate::error::{DispatchError, OrderError};
use crate::flight::{Drone, DroneView, FlightEvent};
use crate::locations::LocationRegistry;
use crate::orders::{Order, OrderRequest, OrderStatus};

/// What one tick changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    /// Drones that took off this tick
    pub departed: Vec<String>,
    /// Drones that moved and are still en route
    pub moved: usize,
    /// Orders whose drone arrived this tick
    pub completed_orders: Vec<String>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.departed.is_empty() && self.moved == 0 && self.completed_orders.is_empty()
    }
}

/// Point-in-time view handed to observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub running: bool,
    pub speed_multiplier: f64,
    pub tick_count: u64,
    pub orders: Vec<Order>,
    pub drones: Vec<DroneView>,
}

pub struct Simulation {
    registry: LocationRegistry,
    catalog: Option<RouteCatalog>,
    orders: Vec<Order>,
    drones: Vec<Drone>,
    /// order id -> drone id, for every order that ever got a drone
    dispatched: HashMap<String, String>,
    running: bool,
    speed: SpeedMultiplier,
    tick_count: u64,
}

impl Simulation {
    pub fn new(registry: LocationRegistry, catalog: Option<RouteCatalog>) -> Self {
        Self {
            registry,
            catalog,
            orders: Vec::new(),
            drones: Vec::new(),
            dispatched: HashMap::new(),
            running: false,
            speed: SpeedMultiplier::default(),
            tick_count: 0,
        }
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> Option<&RouteCatalog> {
        self.catalog.as_ref()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn drones(&self) -> &[Drone] {
        &self.drones
    }

    /// The drone bound to `order_id`, if it was dispatched.
    pub fn drone_for_order(&self, order_id: &str) -> Option<&Drone> {
        let drone_id = self.dispatched.get(order_id)?;
        self.drones.iter().find(|d| &d.id == drone_id)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn speed(&self) -> SpeedMultiplier {
        self.speed
    }

    pub fn set_speed(&mut self, speed: SpeedMultiplier) {
        self.speed = speed;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Accept a new order. While running it is dispatched straight away.
    pub fn submit_order(&mut self, request: &OrderRequest) -> Result<Order, OrderError> {
        let order = Order::from_request(&self.registry, request)?;
        let order_id = order.id.clone();
        let idx = self.orders.len();

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            from = %order.start_location_name,
            to = %order.end_location_name,
            "Order accepted"
        );
        self.orders.push(order);

        if self.running {
            if let Err(err) = self.dispatch_order(&order_id) {
                tracing::warn!(order_id = %order_id, "Dispatch on submit failed: {}", err);
            }
        }

        Ok(self.orders[idx].clone())
    }

    /// Bind a drone to a pending order.
    pub fn dispatch_order(&mut self, order_id: &str) -> Result<&Drone, DispatchError> {
        if let Some(drone_id) = self.dispatched.get(order_id) {
            return Err(DispatchError::AlreadyDispatched {
                order_id: order_id.to_string(),
                drone_id: drone_id.clone(),
            });
        }

        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| DispatchError::UnknownOrder(order_id.to_string()))?;

        if order.status == OrderStatus::Completed {
            return Err(DispatchError::OrderCompleted(order_id.to_string()));
        }

        let assignment = dispatch(order, self.catalog.as_ref());
        let drone = Drone::new(order, assignment);
        order.status = OrderStatus::Assigned;

        tracing::info!(
            order_id = %order.id,
            drone_id = %drone.id,
            waypoints = drone.path.len(),
            altitude_m = drone.altitude_m,
            "Drone dispatched"
        );

        self.dispatched.insert(order.id.clone(), drone.id.clone());
        self.drones.push(drone);
        Ok(&self.drones[self.drones.len() - 1])
    }

    /// Start running and dispatch every pending order in submission order.
    /// Returns the ids of the drones created.
    pub fn start(&mut self) -> Vec<String> {
        self.running = true;

        let pending: Vec<String> = self
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending && !self.dispatched.contains_key(&o.id))
            .map(|o| o.id.clone())
            .collect();

        let mut launched = Vec::with_capacity(pending.len());
        for order_id in pending {
            match self.dispatch_order(&order_id) {
                Ok(drone) => launched.push(drone.id.clone()),
                Err(err) => tracing::warn!(order_id = %order_id, "Skipping dispatch: {}", err),
            }
        }

        tracing::info!(dispatched = launched.len(), speed = %self.speed, "Simulation started");
        launched
    }

    pub fn stop(&mut self) {
        if self.running {
            tracing::info!(tick = self.tick_count, "Simulation stopped");
        }
        self.running = false;
    }

    /// Drop every order and drone and stop.
    pub fn reset(&mut self) {
        self.running = false;
        self.orders.clear();
        self.drones.clear();
        self.dispatched.clear();
        self.tick_count = 0;
        tracing::info!("Simulation reset");
    }

    /// Advance every drone by one tick. Does nothing while stopped.
    ///
    /// Drones never read each other's state, so stepping them in place is
    /// the same as computing all transitions from the pre-tick state. Order
    /// updates are applied after all drones have stepped.
    pub fn tick(&mut self) -> TickReport {
        if !self.running {
            return TickReport {
                tick: self.tick_count,
                ..TickReport::default()
            };
        }

        self.tick_count += 1;
        let mut report = TickReport {
            tick: self.tick_count,
            ..TickReport::default()
        };
        let mut departed_orders = Vec::new();

        for drone in &mut self.drones {
            match drone.advance() {
                Some(FlightEvent::Departed) => {
                    report.departed.push(drone.id.clone());
                    departed_orders.push(drone.order_id.clone());
                }
                Some(FlightEvent::Moved { .. }) => report.moved += 1,
                Some(FlightEvent::Arrived) => {
                    tracing::info!(drone_id = %drone.id, order_id = %drone.order_id, "Delivery completed");
                    report.completed_orders.push(drone.order_id.clone());
                }
                None => {}
            }
        }

        if !departed_orders.is_empty() || !report.completed_orders.is_empty() {
            let completed: HashSet<&str> = report.completed_orders.iter().map(String::as_str).collect();
            let departed: HashSet<&str> = departed_orders.iter().map(String::as_str).collect();
            for order in &mut self.orders {
                if completed.contains(order.id.as_str()) {
                    order.status = OrderStatus::Completed;
                } else if order.status == OrderStatus::Assigned && departed.contains(order.id.as_str()) {
                    order.status = OrderStatus::Delivering;
                }
            }
        }

        tracing::debug!(
            tick = report.tick,
            departed = report.departed.len(),
            moved = report.moved,
            completed = report.completed_orders.len(),
            "Tick applied"
        );
        report
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            running: self.running,
            speed_multiplier: self.speed.get(),
            tick_count: self.tick_count,
            orders: self.orders.clone(),
            drones: self.drones.iter().map(DroneView::from).collect(),
        }
    }
}
