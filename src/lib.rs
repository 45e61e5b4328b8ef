//! Intersection Simulation Library
//!
//! Discrete-time simulation of a four-way signalised intersection, comparing
//! a fixed green timer with an adaptive fuzzy controller.

pub mod simulation;
