//! Core types for the intersection simulation
//!
//! Directions, turning intents and car records. Nothing here knows about
//! scheduling or randomness.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::SimError;

/// Simulation time, in whole ticks
pub type Tick = u32;

/// One of the four approaches of the intersection.
///
/// The clockwise compass order N -> E -> S -> W drives both phase rotation
/// and destination derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    N,
    E,
    S,
    W,
}

impl Direction {
    /// All directions in clockwise order, starting at north
    pub const CLOCKWISE: [Direction; 4] = [Direction::N, Direction::E, Direction::S, Direction::W];

    /// Position in the clockwise order
    pub fn index(self) -> usize {
        match self {
            Direction::N => 0,
            Direction::E => 1,
            Direction::S => 2,
            Direction::W => 3,
        }
    }

    /// Rotate clockwise by `steps` quarter turns (negative turns counter-clockwise)
    pub fn rotate(self, steps: i32) -> Direction {
        let idx = (self.index() as i32 + steps).rem_euclid(4) as usize;
        Self::CLOCKWISE[idx]
    }

    /// The phase that follows this one: N -> E -> S -> W -> N
    pub fn next(self) -> Direction {
        match self {
            Direction::N => Direction::E,
            Direction::E => Direction::S,
            Direction::S => Direction::W,
            Direction::W => Direction::N,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::N => "N",
            Direction::E => "E",
            Direction::S => "S",
            Direction::W => "W",
        }
    }

    /// Parse a signal phase name.
    ///
    /// Only single directions are phases; paired names such as `"NS"` or
    /// `"EW"` are rejected with [`SimError::InvalidPhase`].
    pub fn parse_phase(name: &str) -> Result<Direction, SimError> {
        name.parse::<Direction>()
            .map_err(|_| SimError::InvalidPhase(name.to_string()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Direction::N),
            "E" => Ok(Direction::E),
            "S" => Ok(Direction::S),
            "W" => Ok(Direction::W),
            other => Err(SimError::InvalidDirection(other.to_string())),
        }
    }
}

/// A car's turning behaviour at the stop line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Straight,
    Left,
    Right,
}

impl Intent {
    /// Exit direction for a car arriving from `origin`
    pub fn destination_from(self, origin: Direction) -> Direction {
        match self {
            Intent::Straight => origin.rotate(2),
            Intent::Left => origin.rotate(1),
            Intent::Right => origin.rotate(-1),
        }
    }
}

/// Identifier of a car: its origin plus a per-origin sequence number.
///
/// Rendered as `"N_1"`, `"E_12"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CarId {
    pub origin: Direction,
    pub seq: u64,
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.origin, self.seq)
    }
}

impl Serialize for CarId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for CarId {
    type Err = SimError;

    /// Parse the `"N_12"` form produced by `Display`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (origin, seq) = s
            .split_once('_')
            .ok_or_else(|| SimError::InvalidParameter(format!("malformed car id {s:?}")))?;
        let seq = seq
            .parse()
            .map_err(|_| SimError::InvalidParameter(format!("malformed car id {s:?}")))?;
        Ok(CarId {
            origin: origin.parse()?,
            seq,
        })
    }
}

impl<'de> Deserialize<'de> for CarId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A queued car. Created on arrival, consumed on departure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarRecord {
    pub id: CarId,
    pub origin: Direction,
    pub destination: Direction,
    pub intent: Intent,
    pub spawn_tick: Tick,
}

impl CarRecord {
    pub fn new(id: CarId, intent: Intent, spawn_tick: Tick) -> Self {
        Self {
            id,
            origin: id.origin,
            destination: intent.destination_from(id.origin),
            intent,
            spawn_tick,
        }
    }
}

/// One value per direction, indexed by [`Direction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionMap<T>([T; 4]);

impl<T> DirectionMap<T> {
    pub fn from_fn(mut f: impl FnMut(Direction) -> T) -> Self {
        Self(Direction::CLOCKWISE.map(&mut f))
    }

    /// Iterate `(direction, value)` pairs in clockwise order
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> {
        Direction::CLOCKWISE.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T> Index<Direction> for DirectionMap<T> {
    type Output = T;

    fn index(&self, direction: Direction) -> &T {
        &self.0[direction.index()]
    }
}

impl<T> IndexMut<Direction> for DirectionMap<T> {
    fn index_mut(&mut self, direction: Direction) -> &mut T {
        &mut self.0[direction.index()]
    }
}
