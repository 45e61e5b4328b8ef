//! Run configuration
//!
//! Every field has a default, so a JSON config file only needs the values it
//! wants to change.

use serde::{Deserialize, Serialize};

use super::arrivals::validate_rate;
use super::error::SimError;
use super::fuzzy::FuzzyConfig;
use super::types::{Direction, Tick};

/// Default number of ticks per run
pub const DEFAULT_TICKS: Tick = 300;
/// Default expected arrivals per approach per tick
pub const DEFAULT_ARRIVAL_RATE: f64 = 0.4;
/// Default cars discharged per green tick
pub const DEFAULT_DEPARTURE_CAPACITY: usize = 1;
/// Default green duration of the fixed-timer policy
pub const DEFAULT_FIXED_DURATION: Tick = 30;
/// Green duration of the opening phase
pub const DEFAULT_INITIAL_GREEN: Tick = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub ticks: Tick,
    /// Expected arrivals per approach per tick (Poisson mean)
    pub arrival_rate: f64,
    /// Maximum cars the green approach discharges per tick
    pub departure_capacity: usize,
    pub fixed_duration: Tick,
    pub initial_phase: Direction,
    pub initial_green: Tick,
    /// Seed for arrivals and intents; `None` draws one from the OS
    pub seed: Option<u64>,
    pub fuzzy: FuzzyConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_TICKS,
            arrival_rate: DEFAULT_ARRIVAL_RATE,
            departure_capacity: DEFAULT_DEPARTURE_CAPACITY,
            fixed_duration: DEFAULT_FIXED_DURATION,
            initial_phase: Direction::N,
            initial_green: DEFAULT_INITIAL_GREEN,
            seed: None,
            fuzzy: FuzzyConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_ticks(mut self, ticks: Tick) -> Self {
        self.ticks = ticks;
        self
    }

    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| SimError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        validate_rate(self.arrival_rate)?;
        if self.departure_capacity == 0 {
            return Err(SimError::InvalidParameter(
                "departure capacity must be at least 1".to_string(),
            ));
        }
        if self.fixed_duration == 0 {
            return Err(SimError::InvalidParameter(
                "fixed green duration must be at least 1 tick".to_string(),
            ));
        }
        self.fuzzy.validate()
    }
}
