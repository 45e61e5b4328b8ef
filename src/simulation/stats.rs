//! Run statistics and frame-log analysis
//!
//! Everything derived here from a [`RunResult`] uses the frames alone, the
//! same way an external plotter reading the exported JSON would.

use std::collections::HashMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::frame::{CarEvent, RunResult};
use super::scheduler::Mode;
use super::types::{CarId, Direction, Intent, Tick};

/// Summary metrics of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub mode: Mode,
    pub ticks: Tick,
    pub spawned: usize,
    /// Cars that departed
    pub served: usize,
    /// Cars still queued when the run ended
    pub leftover: usize,
    pub avg_wait: f64,
    pub max_wait: Tick,
}

impl RunStats {
    pub fn from_waits(
        mode: Mode,
        ticks: Tick,
        wait_times: &[Tick],
        spawned: usize,
        leftover: usize,
    ) -> Self {
        let avg_wait = if wait_times.is_empty() {
            0.0
        } else {
            wait_times.iter().map(|&w| f64::from(w)).sum::<f64>() / wait_times.len() as f64
        };
        Self {
            mode,
            ticks,
            spawned,
            served: wait_times.len(),
            leftover,
            avg_wait,
            max_wait: wait_times.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Frame log and statistics of a finished run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: RunResult,
    pub stats: RunStats,
}

/// Fixed timer vs. fuzzy controller over the same configuration
#[derive(Debug, Clone)]
pub struct Comparison {
    pub fixed: RunOutcome,
    pub fuzzy: RunOutcome,
}

impl Comparison {
    /// Average-wait advantage of the fuzzy controller, in ticks per car
    /// (positive when fuzzy is faster)
    pub fn avg_wait_gain(&self) -> f64 {
        self.fixed.stats.avg_wait - self.fuzzy.stats.avg_wait
    }

    /// Head-to-head table of the two runs
    pub fn summary_table(&self) -> String {
        let fixed = &self.fixed.stats;
        let fuzzy = &self.fuzzy.stats;
        let rule = "=".repeat(52);

        let mut out = format!("{rule}\n");
        out.push_str(&table_row("METRIC", "FIXED", "FUZZY"));
        out.push_str(&format!("{}\n", "-".repeat(52)));
        out.push_str(&table_row(
            "Avg Wait Time",
            format!("{:.2}", fixed.avg_wait),
            format!("{:.2}", fuzzy.avg_wait),
        ));
        out.push_str(&table_row("Max Wait Time", fixed.max_wait, fuzzy.max_wait));
        out.push_str(&table_row("Cars Served", fixed.served, fuzzy.served));
        out.push_str(&table_row("Queue Leftover", fixed.leftover, fuzzy.leftover));
        out.push_str(&format!("{rule}\n"));

        let gain = self.avg_wait_gain();
        if gain > 0.0 {
            out.push_str(&format!("Fuzzy control is faster by {gain:.2} ticks per car\n"));
        } else {
            out.push_str("Fuzzy control did not beat the fixed timer on average wait\n");
        }
        out
    }
}

fn table_row(label: &str, fixed: impl Display, fuzzy: impl Display) -> String {
    format!("{label:<20} | {:<12} | {:<12}\n", fixed.to_string(), fuzzy.to_string())
}

/// A stretch of green on one approach, as seen in the frame log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpan {
    pub phase: Direction,
    pub start_tick: Tick,
    /// Green timer at the first frame of the span
    pub duration: Tick,
}

/// One car's life rebuilt from the frame log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarLifecycle {
    pub car_id: CarId,
    pub origin: Direction,
    pub destination: Direction,
    pub intent: Intent,
    pub spawn_tick: Tick,
    /// `None` while the car is still queued
    pub departure_tick: Option<Tick>,
}

impl CarLifecycle {
    /// Ticks spent queued; `None` while queued or when the log records a
    /// departure before the spawn
    pub fn wait(&self) -> Option<Tick> {
        self.departure_tick
            .and_then(|t| t.checked_sub(self.spawn_tick))
    }
}

impl RunResult {
    /// Total queued cars at the start of every tick
    pub fn total_queue_series(&self) -> Vec<(Tick, usize)> {
        self.frames
            .iter()
            .map(|frame| (frame.t, frame.traffic_state.queues.total()))
            .collect()
    }

    /// Successive green phases, starting at each phase change
    pub fn phase_history(&self) -> Vec<PhaseSpan> {
        let mut history: Vec<PhaseSpan> = Vec::new();
        for frame in &self.frames {
            let state = &frame.traffic_state;
            if history.last().map(|span| span.phase) != Some(state.current_phase) {
                history.push(PhaseSpan {
                    phase: state.current_phase,
                    start_tick: frame.t,
                    duration: state.green_timer,
                });
            }
        }
        history
    }

    /// Every spawned car, in spawn order, with its departure tick if any
    pub fn car_lifecycles(&self) -> Vec<CarLifecycle> {
        let mut cars: Vec<CarLifecycle> = Vec::new();
        let mut index: HashMap<CarId, usize> = HashMap::new();

        for frame in &self.frames {
            for event in &frame.car_events {
                let CarEvent::Spawn {
                    car_id,
                    origin,
                    destination,
                    intent,
                    ..
                } = *event;
                index.insert(car_id, cars.len());
                cars.push(CarLifecycle {
                    car_id,
                    origin,
                    destination,
                    intent,
                    spawn_tick: frame.t,
                    departure_tick: None,
                });
            }
            for departure in &frame.departures {
                if let Some(&i) = index.get(&departure.car_id) {
                    cars[i].departure_tick = Some(frame.t);
                }
            }
        }
        cars
    }

    /// Wait of every departed car, rebuilt from spawn and departure events
    pub fn wait_times(&self) -> Vec<Tick> {
        self.car_lifecycles()
            .iter()
            .filter_map(CarLifecycle::wait)
            .collect()
    }
}
