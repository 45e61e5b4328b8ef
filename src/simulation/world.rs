//! Simulation driver
//!
//! A [`SimWorld`] owns one intersection for one run. Each tick it generates
//! arrivals, lets the green approach discharge, rotates the signal when the
//! green timer runs out and records a [`Frame`].

use std::sync::Arc;
use std::thread;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::arrivals::generate_arrivals;
use super::config::SimConfig;
use super::error::SimError;
use super::frame::{CarEvent, DepartureEvent, Frame, RunMetadata, RunResult, TrafficState};
use super::fuzzy::{FuzzyController, RuleBase};
use super::intersection::IntersectionState;
use super::scheduler::{Mode, PhaseScheduler, SchedulingPolicy};
use super::stats::{Comparison, RunOutcome, RunStats};
use super::types::{Direction, Tick};

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,
    state: IntersectionState,
    scheduler: PhaseScheduler,
    rng: StdRng,
    frames: Vec<Frame>,
    /// Wait of every departed car, in departure order
    wait_times: Vec<Tick>,
    total_spawned: usize,
}

impl SimWorld {
    pub fn new(config: SimConfig, policy: SchedulingPolicy) -> Result<Self, SimError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut state = IntersectionState::new();
        state.set_green_light(config.initial_green, config.initial_phase);
        let scheduler = PhaseScheduler::new(policy, config.arrival_rate);

        Ok(Self {
            frames: Vec::with_capacity(config.ticks as usize),
            config,
            state,
            scheduler,
            rng,
            wait_times: Vec::new(),
            total_spawned: 0,
        })
    }

    /// World scheduled by the fixed timer
    pub fn new_fixed(config: SimConfig) -> Result<Self, SimError> {
        let policy = SchedulingPolicy::Fixed {
            duration: config.fixed_duration,
        };
        Self::new(config, policy)
    }

    /// World scheduled by the fuzzy controller over `rule_base`.
    ///
    /// The rule base must have been built from `config.fuzzy`.
    pub fn new_fuzzy(config: SimConfig, rule_base: Arc<RuleBase>) -> Result<Self, SimError> {
        if rule_base.config() != &config.fuzzy {
            return Err(SimError::InvalidConfig(
                "fuzzy rule base was built from a different fuzzy config".to_string(),
            ));
        }
        let policy = SchedulingPolicy::Fuzzy(FuzzyController::new(rule_base));
        Self::new(config, policy)
    }

    /// World for `mode`; `rule_base` is only used by [`Mode::Fuzzy`]
    pub fn for_mode(
        mode: Mode,
        config: SimConfig,
        rule_base: Arc<RuleBase>,
    ) -> Result<Self, SimError> {
        match mode {
            Mode::Fixed => Self::new_fixed(config),
            Mode::Fuzzy => Self::new_fuzzy(config, rule_base),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &IntersectionState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.scheduler.mode()
    }

    /// Index of the next tick to run
    pub fn current_tick(&self) -> Tick {
        self.state.current_tick()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn wait_times(&self) -> &[Tick] {
        &self.wait_times
    }

    pub fn total_spawned(&self) -> usize {
        self.total_spawned
    }

    pub fn total_departed(&self) -> usize {
        self.wait_times.len()
    }

    /// Run a single tick and record its frame
    pub fn tick(&mut self) -> Result<(), SimError> {
        let t = self.state.current_tick();
        let traffic_state = TrafficState {
            current_phase: self.state.current_phase(),
            green_timer: self.state.green_timer(),
            queues: self.state.queue_lengths().into(),
        };

        let mut car_events = Vec::new();
        for direction in Direction::CLOCKWISE {
            let count = generate_arrivals(self.config.arrival_rate, &mut self.rng)?;
            let positions = self.state.add_cars(direction, count, &mut self.rng);
            car_events.extend(
                self.state
                    .queue(direction)
                    .iter()
                    .enumerate()
                    .skip(positions.start)
                    .map(|(position, car)| CarEvent::spawn(car, position)),
            );
            self.total_spawned += count;
        }

        let departures = self.state.step(self.config.departure_capacity);
        self.wait_times
            .extend(departures.cars.iter().map(|departed| departed.wait()));
        let departure_events = departures.cars.iter().map(DepartureEvent::from).collect();

        self.scheduler.advance_if_expired(&mut self.state, t);

        self.frames.push(Frame {
            t,
            traffic_state,
            car_events,
            departures: departure_events,
        });
        Ok(())
    }

    /// Run all configured ticks and return the log with its statistics
    pub fn run(mut self) -> Result<RunOutcome, SimError> {
        info!(
            "Starting {} run: {} ticks, arrival rate {}, capacity {}, seed {:?}",
            self.mode(),
            self.config.ticks,
            self.config.arrival_rate,
            self.config.departure_capacity,
            self.config.seed
        );

        while self.current_tick() < self.config.ticks {
            self.tick()?;
        }

        let outcome = self.finish();
        info!(
            "{} run complete: served {}, leftover {}, avg wait {:.2}, max wait {}",
            outcome.stats.mode,
            outcome.stats.served,
            outcome.stats.leftover,
            outcome.stats.avg_wait,
            outcome.stats.max_wait
        );
        Ok(outcome)
    }

    /// Close the run at the current tick
    pub fn finish(self) -> RunOutcome {
        let ticks = self.current_tick();
        let stats = RunStats::from_waits(
            self.mode(),
            ticks,
            &self.wait_times,
            self.total_spawned,
            self.state.total_queued(),
        );
        let result = RunResult {
            metadata: RunMetadata {
                mode: stats.mode,
                duration: ticks,
                avg_wait_time: stats.avg_wait,
            },
            frames: self.frames,
        };
        RunOutcome { result, stats }
    }
}

/// Run the fixed timer and the fuzzy controller over the same configuration.
///
/// The two runs share nothing but the read-only rule base and execute on
/// separate threads. Both see the same arrivals; without a configured seed
/// one is drawn here and shared.
pub fn run_comparison(config: &SimConfig, rule_base: Arc<RuleBase>) -> Result<Comparison, SimError> {
    let mut config = config.clone();
    let seed = *config.seed.get_or_insert_with(rand::random);
    info!("Comparing policies with seed {}", seed);

    let fixed_world = SimWorld::new_fixed(config.clone())?;
    let fuzzy_world = SimWorld::new_fuzzy(config, rule_base)?;

    let (fixed, fuzzy) = thread::scope(|scope| {
        let fixed = scope.spawn(move || fixed_world.run());
        let fuzzy = scope.spawn(move || fuzzy_world.run());
        (join_run(fixed), join_run(fuzzy))
    });

    Ok(Comparison {
        fixed: fixed?,
        fuzzy: fuzzy?,
    })
}

fn join_run<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
