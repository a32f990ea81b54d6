//! Simulation clock.
//!
//! Owns the one task that ticks the simulation. Restarting (for a new speed)
//! always stops and awaits the previous task first, so two timers never run
//! at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use dispatch_core::SpeedMultiplier;

use crate::state::AppState;

struct ClockRun {
    period: Duration,
    shutdown: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct SimulationClock {
    base_interval: Duration,
    run: Option<ClockRun>,
}

impl SimulationClock {
    pub fn new(base_interval: Duration) -> Self {
        Self {
            base_interval,
            run: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn period(&self) -> Option<Duration> {
        self.run.as_ref().map(|run| run.period)
    }

    /// Begin ticking at `base_interval / speed`, replacing any running timer.
    pub async fn start(&mut self, state: Arc<AppState>, speed: SpeedMultiplier) {
        self.stop().await;

        let period = speed.tick_interval(self.base_interval);
        let (shutdown, rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_tick_loop(state, period, rx));

        tracing::info!(%speed, period_ms = period.as_millis() as u64, "Simulation clock started");
        self.run = Some(ClockRun {
            period,
            shutdown,
            handle,
        });
    }

    /// Halt ticking. Returns once the tick task has exited.
    pub async fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };

        // The receiver is gone only if the task already ended.
        let _ = run.shutdown.send(());
        if let Err(err) = run.handle.await {
            tracing::warn!("Tick loop ended abnormally: {}", err);
        }
        tracing::info!("Simulation clock stopped");
    }
}

/// Tick the simulation every `period` until shutdown.
///
/// The first tick fires one period after start. Late ticks are delayed,
/// never bunched up.
pub async fn run_tick_loop(state: Arc<AppState>, period: Duration, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::debug!("Tick loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                state.apply_tick();
            }
        }
    }
}
