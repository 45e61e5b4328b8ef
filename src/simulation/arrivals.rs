//! Arrival generation
//!
//! Arrival counts per tick follow a Poisson distribution with mean `rate`.
//! Each arriving car draws a turning intent; its destination follows from
//! the origin and intent alone.

use rand::seq::IndexedRandom;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

use super::error::SimError;
use super::types::Intent;

/// Categorical distribution of turning intents
pub const INTENT_WEIGHTS: [(Intent, f64); 3] = [
    (Intent::Straight, 0.6),
    (Intent::Left, 0.2),
    (Intent::Right, 0.2),
];

/// Draw the number of cars arriving on one approach during one tick.
///
/// `rate` is the expected number of arrivals per tick. It must be finite and
/// non-negative; a rate of zero always yields zero arrivals.
pub fn generate_arrivals<R: Rng + ?Sized>(rate: f64, rng: &mut R) -> Result<usize, SimError> {
    validate_rate(rate)?;
    if rate == 0.0 {
        return Ok(0);
    }

    let poisson = Poisson::new(rate)
        .map_err(|e| SimError::InvalidParameter(format!("arrival rate {rate}: {e}")))?;
    let count: f64 = poisson.sample(rng);
    Ok(count as usize)
}

/// Check that an arrival rate is usable as a Poisson mean
pub fn validate_rate(rate: f64) -> Result<(), SimError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(SimError::InvalidParameter(format!(
            "arrival rate must be a finite non-negative number, got {rate}"
        )));
    }
    Ok(())
}

/// Draw a turning intent from [`INTENT_WEIGHTS`]
pub fn sample_intent<R: Rng + ?Sized>(rng: &mut R) -> Intent {
    // The weights are constant and positive, so the weighted draw cannot fail
    INTENT_WEIGHTS
        .choose_weighted(rng, |&(_, weight)| weight)
        .map(|&(intent, _)| intent)
        .unwrap_or(Intent::Straight)
}
