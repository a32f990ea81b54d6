//! Simulation tick rate.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SpeedError;

/// Tick period at 1x speed.
pub const BASE_TICK_INTERVAL: Duration = Duration::from_millis(1000);

pub const MAX_SPEED_MULTIPLIER: f64 = 100.0;

/// Slowest allowed rate: one tick per 100 base periods.
pub const MIN_SPEED_MULTIPLIER: f64 = 0.01;

/// Speed presets offered to operators.
pub const SPEED_PRESETS: [f64; 4] = [1.0, 2.0, 3.0, 5.0];

/// How many times faster than real time the clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SpeedMultiplier(f64);

impl SpeedMultiplier {
    pub const REAL_TIME: SpeedMultiplier = SpeedMultiplier(1.0);

    pub fn new(value: f64) -> Result<Self, SpeedError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(SpeedError::NotPositive(value));
        }
        if value < MIN_SPEED_MULTIPLIER {
            return Err(SpeedError::TooSlow {
                value,
                min: MIN_SPEED_MULTIPLIER,
            });
        }
        if value > MAX_SPEED_MULTIPLIER {
            return Err(SpeedError::TooFast {
                value,
                max: MAX_SPEED_MULTIPLIER,
            });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Tick period for this multiplier given the 1x period. Saturates at
    /// `Duration::MAX` for absurdly long base periods.
    pub fn tick_interval(self, base: Duration) -> Duration {
        Duration::try_from_secs_f64(base.as_secs_f64() / self.0).unwrap_or(Duration::MAX)
    }
}

impl Default for SpeedMultiplier {
    fn default() -> Self {
        Self::REAL_TIME
    }
}

impl TryFrom<f64> for SpeedMultiplier {
    type Error = SpeedError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SpeedMultiplier> for f64 {
    fn from(speed: SpeedMultiplier) -> Self {
        speed.0
    }
}

impl fmt::Display for SpeedMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}X", self.0)
    }
}
