//! Phase scheduling and configuration tests

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use intersection_sim::simulation::{
    Direction, FuzzyConfig, FuzzyController, IntersectionState, Mode, PhaseScheduler, RuleBase,
    SchedulingPolicy, SimConfig, SimError, Triangle,
};

fn fuzzy_policy(config: FuzzyConfig) -> SchedulingPolicy {
    SchedulingPolicy::Fuzzy(FuzzyController::new(Arc::new(RuleBase::new(config).unwrap())))
}

#[test]
fn test_phase_cycle_is_clockwise() {
    assert_eq!(Direction::N.next(), Direction::E);
    assert_eq!(Direction::E.next(), Direction::S);
    assert_eq!(Direction::S.next(), Direction::W);
    assert_eq!(Direction::W.next(), Direction::N);

    let mut phase = Direction::N;
    for _ in 0..4 {
        phase = phase.next();
    }
    assert_eq!(phase, Direction::N);
}

#[test]
fn test_phase_names_parse() {
    assert_eq!(Direction::parse_phase("E"), Ok(Direction::E));
    assert!(matches!(
        Direction::parse_phase("NS"),
        Err(SimError::InvalidPhase(_))
    ));
    assert!(matches!(
        "X".parse::<Direction>(),
        Err(SimError::InvalidDirection(_))
    ));
}

#[test]
fn test_fixed_policy_ignores_queues() {
    let policy = SchedulingPolicy::Fixed { duration: 30 };
    assert_eq!(policy.mode(), Mode::Fixed);
    assert_eq!(policy.duration_for(0, 0.4), 30);
    assert_eq!(policy.duration_for(500, 3.0), 30);
}

#[test]
fn test_fuzzy_policy_scales_with_queue() {
    let policy = fuzzy_policy(FuzzyConfig::default());
    assert_eq!(policy.mode(), Mode::Fuzzy);

    let short = policy.duration_for(2, 0.1);
    let long = policy.duration_for(50, 0.8);
    assert!(short <= 20, "short queue got {short}");
    assert!((40..=50).contains(&long), "long queue got {long}");
    assert!(long > short);
}

#[test]
fn test_fuzzy_policy_respects_minimum_green() {
    let mut config = FuzzyConfig::default();
    config.extension.low = Triangle::new(0.0, 0.0, 5.0);
    let controller = FuzzyController::new(Arc::new(RuleBase::new(config.clone()).unwrap()));
    assert!(controller.green_duration(0, 0.0) < 5);

    let policy = fuzzy_policy(config);
    assert_eq!(policy.duration_for(0, 0.0), 5);
}

#[test]
fn test_scheduler_waits_for_timer() {
    let mut state = IntersectionState::new();
    state.set_green_light(3, Direction::N);
    let mut scheduler = PhaseScheduler::new(SchedulingPolicy::Fixed { duration: 12 }, 0.4);

    assert_eq!(scheduler.advance_if_expired(&mut state, 0), None);
    assert_eq!(state.current_phase(), Direction::N);
    assert_eq!(scheduler.switches(), 0);
}

#[test]
fn test_scheduler_rotates_on_expiry() {
    let mut state = IntersectionState::new();
    let mut scheduler = PhaseScheduler::new(SchedulingPolicy::Fixed { duration: 12 }, 0.4);

    let mut seen = Vec::new();
    for t in 0..5 {
        let (phase, duration) = scheduler.advance_if_expired(&mut state, t).unwrap();
        assert_eq!(duration, 12);
        seen.push(phase);
        state.set_green_light(0, phase);
    }
    assert_eq!(
        seen,
        [Direction::E, Direction::S, Direction::W, Direction::N, Direction::E]
    );
    assert_eq!(scheduler.switches(), 5);
}

#[test]
fn test_fuzzy_scheduler_reads_next_queue() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut state = IntersectionState::new();
    state.add_cars(Direction::E, 50, &mut rng);
    state.set_green_light(0, Direction::N);
    let mut scheduler = PhaseScheduler::new(fuzzy_policy(FuzzyConfig::default()), 0.8);

    let (phase, duration) = scheduler.advance_if_expired(&mut state, 7).unwrap();
    assert_eq!(phase, Direction::E);
    assert!((40..=50).contains(&duration), "got {duration}");
    assert_eq!(state.green_timer(), duration);
}

#[test]
fn test_partial_json_config_uses_defaults() {
    let config = SimConfig::from_json(r#"{ "ticks": 120, "seed": 9 }"#).unwrap();
    assert_eq!(config.ticks, 120);
    assert_eq!(config.seed, Some(9));
    assert_eq!(config.fixed_duration, 30);
    assert_eq!(config.fuzzy, FuzzyConfig::default());
}

#[test]
fn test_json_config_accepts_linguistic_names() {
    let json = r#"{
        "fuzzy": {
            "queue": {
                "short":  { "a": 0.0,  "b": 0.0,  "c": 20.0 },
                "medium": { "a": 10.0, "b": 25.0, "c": 40.0 },
                "long":   { "a": 30.0, "b": 50.0, "c": 50.0 }
            },
            "queue_max": 50.0
        }
    }"#;
    let config = SimConfig::from_json(json).unwrap();
    assert_eq!(config.fuzzy.queue.high, Triangle::new(30.0, 50.0, 50.0));
    assert_eq!(config.fuzzy.queue_max, 50.0);
    assert_eq!(config.fuzzy.arrival, FuzzyConfig::default().arrival);
}

#[test]
fn test_bad_json_config_is_rejected() {
    assert!(matches!(
        SimConfig::from_json("{ not json"),
        Err(SimError::InvalidConfig(_))
    ));
    assert!(matches!(
        SimConfig::from_json(r#"{ "fixed_duration": 0 }"#),
        Err(SimError::InvalidParameter(_))
    ));
    assert!(matches!(
        SimConfig::from_json(r#"{ "initial_phase": "NS" }"#),
        Err(SimError::InvalidConfig(_))
    ));
    assert!(matches!(
        SimConfig::from_json(r#"{ "fuzzy": { "min_green": 0 } }"#),
        Err(SimError::InvalidConfig(_))
    ));
}
