//! Deterministic simulation harness for posture verifier testing.
//!
//! This crate pairs the sans-IO verifier with a simulated collector and a
//! seeded fault injector, so that complete assessment exchanges can be run
//! and checked by oracles without any host or network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collector;
pub mod faults;
pub mod scenario;

pub use collector::Collector;
pub use faults::FaultInjector;
