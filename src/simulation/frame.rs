//! Frame log records
//!
//! One [`Frame`] per tick, serialised with the field names downstream
//! renderers and plotters read. A [`RunResult`] bundles the frames of a run
//! with its metadata.

use serde::{Deserialize, Serialize};

use super::intersection::DepartedCar;
use super::scheduler::Mode;
use super::types::{CarId, CarRecord, Direction, DirectionMap, Intent, Tick};

/// Queue length per approach, keyed `N`, `S`, `E`, `W` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueLengths {
    #[serde(rename = "N")]
    pub n: usize,
    #[serde(rename = "S")]
    pub s: usize,
    #[serde(rename = "E")]
    pub e: usize,
    #[serde(rename = "W")]
    pub w: usize,
}

impl QueueLengths {
    pub fn get(&self, direction: Direction) -> usize {
        match direction {
            Direction::N => self.n,
            Direction::S => self.s,
            Direction::E => self.e,
            Direction::W => self.w,
        }
    }

    pub fn total(&self) -> usize {
        self.n + self.s + self.e + self.w
    }
}

impl From<DirectionMap<usize>> for QueueLengths {
    fn from(map: DirectionMap<usize>) -> Self {
        Self {
            n: map[Direction::N],
            s: map[Direction::S],
            e: map[Direction::E],
            w: map[Direction::W],
        }
    }
}

/// Signal and queues as they stood at the start of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficState {
    pub current_phase: Direction,
    pub green_timer: Tick,
    pub queues: QueueLengths,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum CarEvent {
    Spawn {
        car_id: CarId,
        origin: Direction,
        destination: Direction,
        intent: Intent,
        /// Zero-based position in the origin queue right after arrival
        queue_position: usize,
    },
}

impl CarEvent {
    pub fn spawn(car: &CarRecord, queue_position: usize) -> Self {
        CarEvent::Spawn {
            car_id: car.id,
            origin: car.origin,
            destination: car.destination,
            intent: car.intent,
            queue_position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureEvent {
    pub car_id: CarId,
    pub origin: Direction,
    pub destination: Direction,
}

impl From<&DepartedCar> for DepartureEvent {
    fn from(departed: &DepartedCar) -> Self {
        Self {
            car_id: departed.car.id,
            origin: departed.car.origin,
            destination: departed.car.destination,
        }
    }
}

/// Snapshot of one tick plus everything that happened during it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub t: Tick,
    pub traffic_state: TrafficState,
    pub car_events: Vec<CarEvent>,
    pub departures: Vec<DepartureEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub mode: Mode,
    /// Number of ticks simulated
    pub duration: Tick,
    pub avg_wait_time: f64,
}

/// Complete log of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub metadata: RunMetadata,
    pub frames: Vec<Frame>,
}

impl RunResult {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
