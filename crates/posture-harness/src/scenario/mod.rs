//! Scenario testing framework for deterministic simulation tests.
//!
//! This module provides a declarative API for writing scenario-based tests
//! that follow the Oracle Pattern. Scenarios drive a verifier and a simulated
//! collector through message rounds and enforce oracle verification.

mod builder;
pub mod oracle;
mod world;

pub use builder::{DEFAULT_MAX_ROUNDS, RunnableScenario, Scenario};
pub use oracle::OracleFn;
pub use world::{CONNECTION_ID, World};
