//! Error types for the intersection simulation

use thiserror::Error;

/// Errors surfaced by the simulation core.
///
/// All of these are rejected at the boundary and leave the intersection
/// state untouched. Fuzzy inference never produces one; it falls back to a
/// default duration instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid direction: {0:?} (expected one of N, E, S, W)")]
    InvalidDirection(String),

    #[error("invalid phase: {0:?} (a phase is exactly one of N, E, S, W)")]
    InvalidPhase(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
