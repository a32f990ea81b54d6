//! In-memory simulation store.
//!
//! One mutex guards the whole simulation so that a tick, a dispatch or a
//! reset is applied as a single step. The lock is never held across an
//! `.await`.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use dispatch_core::{
    DispatchError, Drone, LocationRegistry, Order, OrderError, OrderRequest, RouteCatalog, Simulation,
    SimulationSnapshot, SpeedMultiplier, TickReport,
};

use crate::config::Config;
use crate::loops::tick_loop::SimulationClock;

const STREAM_CAPACITY: usize = 64;

/// Why a snapshot was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEvent {
    Tick,
    OrderSubmitted,
    Dispatched,
    Started,
    Stopped,
    SpeedChanged,
    Reset,
}

/// A serialized snapshot ready to fan out to stream subscribers.
#[derive(Debug, Clone)]
pub struct StreamMessage {
    pub event: StreamEvent,
    pub payload: Arc<str>,
}

#[derive(Serialize)]
struct StreamEnvelope<'a> {
    event: StreamEvent,
    snapshot: &'a SimulationSnapshot,
}

/// Application state shared by the API and the clock.
pub struct AppState {
    sim: Mutex<Simulation>,
    clock: tokio::sync::Mutex<SimulationClock>,
    pub tx: broadcast::Sender<StreamMessage>,
    config: Config,
}

impl AppState {
    pub fn new(config: Config, registry: LocationRegistry, catalog: Option<RouteCatalog>) -> Self {
        let (tx, _) = broadcast::channel(STREAM_CAPACITY);
        let mut sim = Simulation::new(registry, catalog);
        sim.set_speed(config.initial_speed);

        Self {
            sim: Mutex::new(sim),
            clock: tokio::sync::Mutex::new(SimulationClock::new(config.tick_base)),
            tx,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn sim(&self) -> MutexGuard<'_, Simulation> {
        // Keep serving after a panic in another handler.
        self.sim.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with exclusive access to the simulation.
    pub fn with_sim<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> R {
        let mut guard = self.sim();
        f(&mut guard)
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        self.sim().snapshot()
    }

    pub fn locations(&self) -> LocationRegistry {
        self.sim().registry().clone()
    }

    pub fn get_orders(&self) -> Vec<Order> {
        self.sim().orders().to_vec()
    }

    pub fn get_order(&self, order_id: &str) -> Option<Order> {
        self.sim().order(order_id).cloned()
    }

    pub fn get_drones(&self) -> Vec<Drone> {
        self.sim().drones().to_vec()
    }

    /// Serialize the current snapshot and push it to stream subscribers.
    pub fn publish(&self, event: StreamEvent) -> SimulationSnapshot {
        let snapshot = self.snapshot();
        self.broadcast(event, &snapshot);
        snapshot
    }

    fn broadcast(&self, event: StreamEvent, snapshot: &SimulationSnapshot) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        match serde_json::to_string(&StreamEnvelope { event, snapshot }) {
            Ok(json) => {
                // Send only fails when every subscriber went away meanwhile.
                let _ = self.tx.send(StreamMessage {
                    event,
                    payload: Arc::from(json),
                });
            }
            Err(err) => tracing::error!("Failed to serialize snapshot: {}", err),
        }
    }

    pub fn submit_order(&self, request: &OrderRequest) -> Result<Order, OrderError> {
        let (order, snapshot) = self.with_sim(|sim| {
            let order = sim.submit_order(request)?;
            Ok::<_, OrderError>((order, sim.snapshot()))
        })?;
        self.broadcast(StreamEvent::OrderSubmitted, &snapshot);
        Ok(order)
    }

    pub fn dispatch_order(&self, order_id: &str) -> Result<Drone, DispatchError> {
        let (drone, snapshot) = self.with_sim(|sim| {
            let drone = sim.dispatch_order(order_id)?.clone();
            Ok::<_, DispatchError>((drone, sim.snapshot()))
        })?;
        self.broadcast(StreamEvent::Dispatched, &snapshot);
        Ok(drone)
    }

    /// One clock tick, applied under the simulation lock.
    pub fn apply_tick(&self) -> TickReport {
        let (report, snapshot) = self.with_sim(|sim| {
            let report = sim.tick();
            (report, sim.snapshot())
        });
        self.broadcast(StreamEvent::Tick, &snapshot);
        report
    }

    /// Start (or restart) ticking. `speed` overrides the current multiplier.
    pub async fn start_simulation(self: &Arc<Self>, speed: Option<SpeedMultiplier>) -> SimulationSnapshot {
        let mut clock = self.clock.lock().await;
        let speed = self.with_sim(|sim| {
            if let Some(speed) = speed {
                sim.set_speed(speed);
            }
            sim.start();
            sim.speed()
        });
        clock.start(Arc::clone(self), speed).await;
        drop(clock);

        self.publish(StreamEvent::Started)
    }

    pub async fn stop_simulation(&self) -> SimulationSnapshot {
        let mut clock = self.clock.lock().await;
        clock.stop().await;
        self.with_sim(Simulation::stop);
        drop(clock);

        self.publish(StreamEvent::Stopped)
    }

    /// Change the tick rate. A running clock is restarted at the new rate;
    /// drone progress is untouched.
    pub async fn set_speed(self: &Arc<Self>, speed: SpeedMultiplier) -> SimulationSnapshot {
        let mut clock = self.clock.lock().await;
        let running = self.with_sim(|sim| {
            sim.set_speed(speed);
            sim.is_running()
        });
        if running && clock.is_running() {
            clock.start(Arc::clone(self), speed).await;
        }
        drop(clock);

        tracing::info!(%speed, "Simulation speed changed");
        self.publish(StreamEvent::SpeedChanged)
    }

    /// Stop the clock and wipe all orders and drones.
    pub async fn reset(&self) -> SimulationSnapshot {
        let mut clock = self.clock.lock().await;
        clock.stop().await;
        self.with_sim(Simulation::reset);
        drop(clock);

        self.publish(StreamEvent::Reset)
    }

    pub async fn clock_running(&self) -> bool {
        self.clock.lock().await.is_running()
    }

    /// Current tick period, or `None` while the clock is stopped.
    pub async fn tick_period(&self) -> Option<std::time::Duration> {
        self.clock.lock().await.period()
    }
}
