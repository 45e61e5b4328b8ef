//! Fuzzy green-light controller
//!
//! Maps the queue length of the approach about to turn green and the arrival
//! intensity to a recommended green duration (the "extension").
//!
//! Inference runs as three pure stages:
//!
//! 1. [`fuzzify`]: crisp input -> membership degree in each linguistic term
//! 2. [`aggregate`]: rule firing strengths (AND = min), max-combined per output term
//! 3. [`defuzzify`]: centroid of the clipped output sets over the sampled output domain
//!
//! The [`RuleBase`] is built once from a [`FuzzyConfig`] and shared read-only
//! (behind an `Arc`) by every controller that uses it.

use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::SimError;
use super::types::Tick;

/// Triangular membership function with vertices `(a, b, c)`.
///
/// `a == b` or `b == c` makes a shoulder: membership stays at 1 on that edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Triangle {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn membership(&self, x: f64) -> f64 {
        let Triangle { a, b, c } = *self;
        if x < a || x > c {
            0.0
        } else if x < b {
            (x - a) / (b - a)
        } else if x > b {
            (c - x) / (c - b)
        } else {
            1.0
        }
    }

    fn validate(&self, name: &str) -> Result<(), SimError> {
        let Triangle { a, b, c } = *self;
        if !(a.is_finite() && b.is_finite() && c.is_finite()) || a > b || b > c {
            return Err(SimError::InvalidConfig(format!(
                "membership set {name} must satisfy a <= b <= c, got ({a}, {b}, {c})"
            )));
        }
        Ok(())
    }
}

/// Linguistic term of a three-way partition.
///
/// Queue length and extension read these as short / medium / long, arrival
/// intensity as low / medium / high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    Low,
    Medium,
    High,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::Low, Term::Medium, Term::High];

    fn index(self) -> usize {
        match self {
            Term::Low => 0,
            Term::Medium => 1,
            Term::High => 2,
        }
    }
}

/// Degree of membership per [`Term`]
pub type Degrees = [f64; 3];

/// Three overlapping membership sets over one variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    #[serde(alias = "short")]
    pub low: Triangle,
    pub medium: Triangle,
    #[serde(alias = "long")]
    pub high: Triangle,
}

impl Partition {
    pub fn set(&self, term: Term) -> &Triangle {
        match term {
            Term::Low => &self.low,
            Term::Medium => &self.medium,
            Term::High => &self.high,
        }
    }

    fn validate(&self, variable: &str) -> Result<(), SimError> {
        self.low.validate(&format!("{variable}.low"))?;
        self.medium.validate(&format!("{variable}.medium"))?;
        self.high.validate(&format!("{variable}.high"))
    }
}

/// `IF queue IS .. AND arrival IS .. THEN extension IS ..`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub queue: Term,
    pub arrival: Term,
    pub extension: Term,
}

const fn rule(queue: Term, arrival: Term, extension: Term) -> Rule {
    Rule {
        queue,
        arrival,
        extension,
    }
}

/// One rule per (queue, arrival) pair
pub const DEFAULT_RULES: [Rule; 9] = [
    rule(Term::Low, Term::Low, Term::Low),
    rule(Term::Low, Term::Medium, Term::Low),
    rule(Term::Low, Term::High, Term::Medium),
    rule(Term::Medium, Term::Low, Term::Medium),
    rule(Term::Medium, Term::Medium, Term::Medium),
    rule(Term::Medium, Term::High, Term::Medium),
    rule(Term::High, Term::Low, Term::Medium),
    rule(Term::High, Term::Medium, Term::High),
    rule(Term::High, Term::High, Term::High),
];

/// Breakpoints and limits of the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Upper end of the queue-length domain; longer queues are clamped
    pub queue_max: f64,
    pub queue: Partition,
    /// Upper end of the arrival-intensity domain
    pub arrival_max: f64,
    /// Factor turning an arrival rate (cars/tick) into arrival intensity
    pub arrival_scale: f64,
    pub arrival: Partition,
    /// Upper end of the extension domain, in ticks
    pub extension_max: f64,
    pub extension: Partition,
    /// Spacing of the centroid samples over the extension domain
    pub resolution: f64,
    /// Duration used when no centroid exists
    pub fallback_duration: Tick,
    /// Floor applied by the adaptive scheduling policy
    pub min_green: Tick,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            queue_max: 80.0,
            queue: Partition {
                low: Triangle::new(0.0, 0.0, 20.0),
                medium: Triangle::new(15.0, 30.0, 45.0),
                high: Triangle::new(40.0, 80.0, 80.0),
            },
            arrival_max: 10.0,
            arrival_scale: 10.0,
            arrival: Partition {
                low: Triangle::new(0.0, 0.0, 4.0),
                medium: Triangle::new(2.0, 5.0, 8.0),
                high: Triangle::new(6.0, 10.0, 10.0),
            },
            extension_max: 60.0,
            extension: Partition {
                low: Triangle::new(0.0, 0.0, 20.0),
                medium: Triangle::new(15.0, 30.0, 45.0),
                high: Triangle::new(35.0, 60.0, 60.0),
            },
            resolution: 1.0,
            fallback_duration: 15,
            min_green: 5,
        }
    }
}

impl FuzzyConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        for (name, value) in [
            ("queue_max", self.queue_max),
            ("arrival_max", self.arrival_max),
            ("arrival_scale", self.arrival_scale),
            ("extension_max", self.extension_max),
            ("resolution", self.resolution),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        self.queue.validate("queue")?;
        self.arrival.validate("arrival")?;
        self.extension.validate("extension")?;
        for (name, value) in [
            ("min_green", self.min_green),
            ("fallback_duration", self.fallback_duration),
        ] {
            if value == 0 {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be at least 1 tick"
                )));
            }
        }
        Ok(())
    }
}

/// Membership degree of `x` in each set of `partition`
pub fn fuzzify(partition: &Partition, x: f64) -> Degrees {
    Term::ALL.map(|term| partition.set(term).membership(x))
}

/// Firing strength of every output term.
///
/// Each rule fires with `min(queue degree, arrival degree)`; rules sharing
/// an output term are combined with `max`.
pub fn aggregate(rules: &[Rule], queue: &Degrees, arrival: &Degrees) -> Degrees {
    let mut strengths: Degrees = [0.0; 3];
    for rule in rules {
        let firing = queue[rule.queue.index()].min(arrival[rule.arrival.index()]);
        let slot = &mut strengths[rule.extension.index()];
        *slot = slot.max(firing);
    }
    strengths
}

/// Centroid of the aggregated output membership.
///
/// `samples` pairs each domain point with its membership in every output
/// term. Returns `None` when the aggregate is zero everywhere.
pub fn defuzzify(samples: &[(f64, Degrees)], strengths: &Degrees) -> Option<f64> {
    let (weighted, total) = samples
        .iter()
        .fold((0.0_f64, 0.0_f64), |(weighted, total), (x, memberships)| {
            let mu = memberships
                .iter()
                .zip(strengths)
                .map(|(&m, &s)| m.min(s))
                .fold(0.0_f64, f64::max);
            (weighted + x * mu, total + mu)
        });

    if total > f64::EPSILON {
        Some(weighted / total)
    } else {
        None
    }
}

/// Immutable rule base with its output domain pre-sampled
#[derive(Debug, Clone)]
pub struct RuleBase {
    config: FuzzyConfig,
    rules: Vec<Rule>,
    samples: Vec<(f64, Degrees)>,
}

impl RuleBase {
    /// Build the standard nine-rule base over `config`
    pub fn new(config: FuzzyConfig) -> Result<Self, SimError> {
        Self::with_rules(config, DEFAULT_RULES.to_vec())
    }

    pub fn with_rules(config: FuzzyConfig, rules: Vec<Rule>) -> Result<Self, SimError> {
        config.validate()?;
        let steps = (config.extension_max / config.resolution).floor() as usize;
        let samples = (0..=steps)
            .map(|i| {
                let x = i as f64 * config.resolution;
                (x, fuzzify(&config.extension, x))
            })
            .collect();
        Ok(Self {
            config,
            rules,
            samples,
        })
    }

    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run the full pipeline on inputs already inside their domains
    pub fn evaluate(&self, queue: f64, arrival: f64) -> Option<f64> {
        let queue = fuzzify(&self.config.queue, queue);
        let arrival = fuzzify(&self.config.arrival, arrival);
        let strengths = aggregate(&self.rules, &queue, &arrival);
        defuzzify(&self.samples, &strengths)
    }
}

/// Adaptive green-duration controller over a shared [`RuleBase`]
#[derive(Debug, Clone)]
pub struct FuzzyController {
    rule_base: Arc<RuleBase>,
}

impl FuzzyController {
    pub fn new(rule_base: Arc<RuleBase>) -> Self {
        Self { rule_base }
    }

    pub fn rule_base(&self) -> &Arc<RuleBase> {
        &self.rule_base
    }

    pub fn min_green(&self) -> Tick {
        self.rule_base.config.min_green
    }

    /// Raw inference on (queue length, arrival intensity), clamping both to
    /// their domains. `None` when the rules leave the output empty.
    pub fn infer(&self, queue: f64, arrival: f64) -> Option<f64> {
        let config = &self.rule_base.config;
        let queue = clamp_input(queue, config.queue_max);
        let arrival = clamp_input(arrival, config.arrival_max);
        self.rule_base.evaluate(queue, arrival)
    }

    /// Recommended extension for a queue of `queue_len` cars fed at
    /// `arrival_rate` cars per tick, falling back to the configured default
    /// when inference yields nothing.
    pub fn extension(&self, queue_len: usize, arrival_rate: f64) -> f64 {
        let config = &self.rule_base.config;
        let intensity = arrival_rate * config.arrival_scale;
        match self.infer(queue_len as f64, intensity) {
            Some(extension) => extension.clamp(0.0, config.extension_max),
            None => {
                warn!(
                    "fuzzy inference produced no output for queue={} rate={}, using fallback {}",
                    queue_len, arrival_rate, config.fallback_duration
                );
                f64::from(config.fallback_duration)
            }
        }
    }

    /// [`extension`](Self::extension) truncated to whole ticks
    pub fn green_duration(&self, queue_len: usize, arrival_rate: f64) -> Tick {
        self.extension(queue_len, arrival_rate) as Tick
    }
}

fn clamp_input(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> FuzzyController {
        FuzzyController::new(Arc::new(RuleBase::new(FuzzyConfig::default()).unwrap()))
    }

    #[test]
    fn triangle_rises_peaks_and_falls() {
        let t = Triangle::new(15.0, 30.0, 45.0);
        assert_eq!(t.membership(10.0), 0.0);
        assert_eq!(t.membership(15.0), 0.0);
        assert!((t.membership(22.5) - 0.5).abs() < 1e-12);
        assert_eq!(t.membership(30.0), 1.0);
        assert!((t.membership(37.5) - 0.5).abs() < 1e-12);
        assert_eq!(t.membership(45.0), 0.0);
        assert_eq!(t.membership(50.0), 0.0);
    }

    #[test]
    fn shoulders_plateau_at_the_edge() {
        let left = Triangle::new(0.0, 0.0, 20.0);
        assert_eq!(left.membership(0.0), 1.0);
        assert!((left.membership(10.0) - 0.5).abs() < 1e-12);

        let right = Triangle::new(40.0, 80.0, 80.0);
        assert_eq!(right.membership(80.0), 1.0);
        assert!((right.membership(50.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn aggregate_takes_min_then_max() {
        let queue = [0.0, 0.2, 0.8];
        let arrival = [0.0, 0.5, 0.5];
        let strengths = aggregate(&DEFAULT_RULES, &queue, &arrival);
        // medium: max(min(0.2, 0.5), min(0.2, 0.5), min(0.8, 0.0)) = 0.2
        assert!((strengths[1] - 0.2).abs() < 1e-12);
        // long: max(min(0.8, 0.5), min(0.8, 0.5)) = 0.5
        assert!((strengths[2] - 0.5).abs() < 1e-12);
        assert_eq!(strengths[0], 0.0);
    }

    #[test]
    fn defuzzify_empty_aggregate_is_none() {
        let samples = vec![(0.0, [1.0, 0.0, 0.0]), (1.0, [0.5, 0.5, 0.0])];
        assert_eq!(defuzzify(&samples, &[0.0, 0.0, 0.0]), None);
    }

    #[test]
    fn long_queue_high_arrival_gives_long_extension() {
        let out = controller().infer(50.0, 8.0).unwrap();
        assert!((40.0..=50.0).contains(&out), "got {out}");
    }

    #[test]
    fn short_queue_low_arrival_gives_short_extension() {
        let out = controller().infer(5.0, 2.0).unwrap();
        assert!(out <= 20.0, "got {out}");
    }

    #[test]
    fn medium_inputs_give_medium_extension() {
        let out = controller().infer(30.0, 5.0).unwrap();
        assert!(out > 20.0 && out < 40.0, "got {out}");
    }

    #[test]
    fn short_queue_high_arrival_is_not_extreme() {
        let out = controller().infer(10.0, 8.0).unwrap();
        assert!(out < 45.0, "got {out}");
    }

    #[test]
    fn output_stays_in_domain_across_inputs() {
        let c = controller();
        for queue in (0..=120).step_by(3) {
            for tenth in 0..=15 {
                let rate = f64::from(tenth) / 10.0;
                let out = c.extension(queue, rate);
                assert!((0.0..=60.0).contains(&out), "q={queue} r={rate} -> {out}");
            }
        }
    }

    #[test]
    fn gap_in_rule_base_falls_back() {
        let mut config = FuzzyConfig::default();
        config.queue.low = Triangle::new(0.0, 0.0, 10.0);
        config.queue.medium = Triangle::new(20.0, 30.0, 40.0);
        let c = FuzzyController::new(Arc::new(RuleBase::new(config).unwrap()));

        assert_eq!(c.infer(15.0, 5.0), None);
        assert_eq!(c.green_duration(15, 0.5), 15);
    }

    #[test]
    fn aggregate_single_firing_rule() {
        let strengths = aggregate(&DEFAULT_RULES, &[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert_eq!(strengths, [1.0_f64, 0.0, 0.0]);
    }

    #[test]
    fn zero_tick_durations_are_rejected() {
        let mut config = FuzzyConfig::default();
        config.min_green = 0;
        assert!(matches!(
            RuleBase::new(config),
            Err(SimError::InvalidConfig(_))
        ));

        let mut config = FuzzyConfig::default();
        config.fallback_duration = 0;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_triangle_is_rejected() {
        let mut config = FuzzyConfig::default();
        config.arrival.medium = Triangle::new(8.0, 5.0, 2.0);
        assert!(matches!(
            RuleBase::new(config),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
