//! Phase scheduling
//!
//! The signal rotates strictly N -> E -> S -> W -> N. When the green timer
//! runs out, the next approach turns green for a duration chosen by the
//! active [`SchedulingPolicy`].

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::fuzzy::FuzzyController;
use super::intersection::IntersectionState;
use super::types::{Direction, Tick};

/// Which scheduling policy produced a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Fixed,
    Fuzzy,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Fixed => "FIXED",
            Mode::Fuzzy => "FUZZY",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long the next phase stays green
#[derive(Debug, Clone)]
pub enum SchedulingPolicy {
    /// Same duration every phase, whatever the queues look like
    Fixed { duration: Tick },
    /// Duration recommended by the fuzzy controller, floored at its
    /// configured minimum green
    Fuzzy(FuzzyController),
}

impl SchedulingPolicy {
    pub fn mode(&self) -> Mode {
        match self {
            SchedulingPolicy::Fixed { .. } => Mode::Fixed,
            SchedulingPolicy::Fuzzy(_) => Mode::Fuzzy,
        }
    }

    /// Green duration for a phase whose queue holds `queue_len` cars
    pub fn duration_for(&self, queue_len: usize, arrival_rate: f64) -> Tick {
        match self {
            SchedulingPolicy::Fixed { duration } => *duration,
            SchedulingPolicy::Fuzzy(controller) => controller
                .green_duration(queue_len, arrival_rate)
                .max(controller.min_green()),
        }
    }
}

/// Drives phase changes on an [`IntersectionState`]
#[derive(Debug, Clone)]
pub struct PhaseScheduler {
    policy: SchedulingPolicy,
    arrival_rate: f64,
    switches: usize,
}

impl PhaseScheduler {
    pub fn new(policy: SchedulingPolicy, arrival_rate: f64) -> Self {
        Self {
            policy,
            arrival_rate,
            switches: 0,
        }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    pub fn mode(&self) -> Mode {
        self.policy.mode()
    }

    /// Number of phase changes made so far
    pub fn switches(&self) -> usize {
        self.switches
    }

    /// Switch to the next phase if the current one is exhausted.
    ///
    /// Returns the new phase and its duration when a switch happened.
    pub fn advance_if_expired(
        &mut self,
        state: &mut IntersectionState,
        tick: Tick,
    ) -> Option<(Direction, Tick)> {
        if state.green_timer() > 0 {
            return None;
        }

        let next = state.current_phase().next();
        let duration = self
            .policy
            .duration_for(state.queue_len(next), self.arrival_rate);
        state.set_green_light(duration, next);
        self.switches += 1;

        debug!(
            "t={} {} phase -> {} for {} ticks (queue {})",
            tick,
            self.mode(),
            next,
            duration,
            state.queue_len(next)
        );
        Some((next, duration))
    }
}
