//! Intersection state: the four approach queues and the signal
//!
//! Exactly one approach is green at any time. Queues are strict FIFO; a car
//! leaves in arrival order regardless of where it is heading.

use std::collections::VecDeque;
use std::ops::Range;

use rand::Rng;

use super::arrivals::sample_intent;
use super::error::SimError;
use super::types::{CarId, CarRecord, Direction, DirectionMap, Tick};

/// A car that left the intersection during a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartedCar {
    pub car: CarRecord,
    pub departure_tick: Tick,
}

impl DepartedCar {
    /// Ticks spent queued before departing
    pub fn wait(&self) -> Tick {
        self.departure_tick.saturating_sub(self.car.spawn_tick)
    }
}

/// Result of one departure step
#[derive(Debug, Clone, Default)]
pub struct Departures {
    /// Number of cars that left, per approach
    pub counts: DirectionMap<usize>,
    /// The departed cars, in departure order
    pub cars: Vec<DepartedCar>,
}

impl Departures {
    pub fn total(&self) -> usize {
        self.cars.len()
    }
}

/// Mutable state of a single intersection.
///
/// The intersection keeps its own clock: arrivals are stamped with it and
/// [`step`](Self::step) departs cars at it before moving it on, so a
/// departure never precedes its arrival.
#[derive(Debug, Clone)]
pub struct IntersectionState {
    queues: DirectionMap<VecDeque<CarRecord>>,
    /// Last sequence number handed out per approach
    car_counters: DirectionMap<u64>,
    current_phase: Direction,
    green_timer: Tick,
    clock: Tick,
}

impl Default for IntersectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl IntersectionState {
    /// Empty queues, north green with an exhausted timer, clock at tick 0
    pub fn new() -> Self {
        Self {
            queues: DirectionMap::default(),
            car_counters: DirectionMap::default(),
            current_phase: Direction::N,
            green_timer: 0,
            clock: 0,
        }
    }

    /// The tick currently being processed
    pub fn current_tick(&self) -> Tick {
        self.clock
    }

    pub fn current_phase(&self) -> Direction {
        self.current_phase
    }

    pub fn green_timer(&self) -> Tick {
        self.green_timer
    }

    pub fn queue(&self, direction: Direction) -> &VecDeque<CarRecord> {
        &self.queues[direction]
    }

    pub fn queue_len(&self, direction: Direction) -> usize {
        self.queues[direction].len()
    }

    /// Snapshot of all queue lengths
    pub fn queue_lengths(&self) -> DirectionMap<usize> {
        DirectionMap::from_fn(|d| self.queues[d].len())
    }

    pub fn total_queued(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Append `count` new cars to the back of `direction`'s queue.
    ///
    /// Each car gets the next per-approach id, a sampled intent and the
    /// current tick as its spawn tick. Returns the queue positions the new
    /// cars occupy.
    pub fn add_cars<R: Rng + ?Sized>(
        &mut self,
        direction: Direction,
        count: usize,
        rng: &mut R,
    ) -> Range<usize> {
        let tick = self.clock;
        let start = self.queues[direction].len();
        for _ in 0..count {
            self.car_counters[direction] += 1;
            let id = CarId {
                origin: direction,
                seq: self.car_counters[direction],
            };
            let car = CarRecord::new(id, sample_intent(rng), tick);
            self.queues[direction].push_back(car);
        }
        start..start + count
    }

    /// [`add_cars`](Self::add_cars) for callers holding an approach name and a
    /// signed count, e.g. scenario files.
    pub fn add_cars_by_name<R: Rng + ?Sized>(
        &mut self,
        direction: &str,
        count: i64,
        rng: &mut R,
    ) -> Result<Range<usize>, SimError> {
        let direction: Direction = direction.parse()?;
        let count = usize::try_from(count).map_err(|_| {
            SimError::InvalidParameter(format!("cannot add a negative number of cars ({count})"))
        })?;
        Ok(self.add_cars(direction, count, rng))
    }

    /// Turn `phase` green for `duration` ticks. Every other approach is red.
    pub fn set_green_light(&mut self, duration: Tick, phase: Direction) {
        self.current_phase = phase;
        self.green_timer = duration;
    }

    /// [`set_green_light`](Self::set_green_light) with a phase name.
    ///
    /// Combined phases such as `"NS"` are rejected and the state is left as is.
    pub fn set_green_light_by_name(&mut self, duration: Tick, phase: &str) -> Result<(), SimError> {
        let phase = Direction::parse_phase(phase)?;
        self.set_green_light(duration, phase);
        Ok(())
    }

    /// Close the current tick and move the clock on by one.
    ///
    /// While the green timer is running, the active approach discharges up to
    /// `departure_capacity` cars from the front of its queue and the timer
    /// counts down by one. Once the timer has reached zero nothing moves until
    /// the next phase is set.
    pub fn step(&mut self, departure_capacity: usize) -> Departures {
        let tick = self.clock;
        self.clock += 1;

        let mut departures = Departures::default();
        if self.green_timer == 0 {
            return departures;
        }

        let active = self.current_phase;
        let queue = &mut self.queues[active];
        let count = queue.len().min(departure_capacity);
        departures.cars.extend(queue.drain(..count).map(|car| DepartedCar {
            car,
            departure_tick: tick,
        }));
        departures.counts[active] = count;

        self.green_timer -= 1;
        departures
    }
}
