//! Headless intersection simulation
//!
//! A single four-way intersection modelled as a discrete-time queueing
//! process, with either a fixed green timer or a fuzzy controller deciding
//! how long each approach stays green. Nothing here renders or writes files;
//! consumers read the [`RunResult`] frame log.

mod arrivals;
mod config;
mod error;
mod frame;
mod fuzzy;
mod intersection;
mod scheduler;
mod stats;
mod types;
mod world;

pub use arrivals::{generate_arrivals, sample_intent, validate_rate, INTENT_WEIGHTS};
pub use config::{
    SimConfig, DEFAULT_ARRIVAL_RATE, DEFAULT_DEPARTURE_CAPACITY, DEFAULT_FIXED_DURATION,
    DEFAULT_INITIAL_GREEN, DEFAULT_TICKS,
};
pub use error::SimError;
pub use frame::{
    CarEvent, DepartureEvent, Frame, QueueLengths, RunMetadata, RunResult, TrafficState,
};
pub use fuzzy::{
    aggregate, defuzzify, fuzzify, Degrees, FuzzyConfig, FuzzyController, Partition, Rule,
    RuleBase, Term, Triangle, DEFAULT_RULES,
};
pub use intersection::{DepartedCar, Departures, IntersectionState};
pub use scheduler::{Mode, PhaseScheduler, SchedulingPolicy};
pub use stats::{CarLifecycle, Comparison, PhaseSpan, RunOutcome, RunStats};
pub use types::{CarId, CarRecord, Direction, DirectionMap, Intent, Tick};
pub use world::{run_comparison, SimWorld};
