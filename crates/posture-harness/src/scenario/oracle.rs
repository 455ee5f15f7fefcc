//! Oracle functions for scenario verification.
//!
//! Oracle functions run at the end of scenarios to verify global consistency.
//! They receive a snapshot of the entire world state and assert invariants.

use posture_core::session::HandshakePhase;
use posture_proto::Recommendation;

use crate::scenario::World;

/// Oracle function type.
///
/// Receives immutable reference to world state and returns:
/// - `Ok(())` if all invariants hold
/// - `Err(message)` if verification fails
pub type OracleFn = Box<dyn FnOnce(&World) -> Result<(), String>>;

/// Create an oracle that verifies the first provided recommendation.
pub fn verdict_is(expected: Recommendation) -> OracleFn {
    Box::new(move |world| match world.verdict() {
        Some(verdict) if verdict == expected => Ok(()),
        Some(verdict) => Err(format!("expected verdict {expected}, got {verdict}")),
        None => Err(format!("expected verdict {expected}, got none")),
    })
}

/// Create an oracle that verifies the assessment was announced at most once
/// and every provided recommendation agrees.
pub fn at_most_one_verdict() -> OracleFn {
    Box::new(|world| {
        let assessments = world.assessments();
        if assessments > 1 {
            return Err(format!("assessment announced {assessments} times"));
        }

        let verdicts = world.verdicts();
        match verdicts.split_first() {
            Some((first, rest)) if rest.iter().any(|verdict| verdict != first) => {
                Err(format!("conflicting verdicts: {verdicts:?}"))
            },
            _ => Ok(()),
        }
    })
}

/// Create an oracle that verifies the policy manager was started exactly
/// once for the session.
pub fn policy_started() -> OracleFn {
    Box::new(|world| {
        let session = world.session();
        let starts = world.policy().starts(session.session_id());
        if starts != 1 {
            return Err(format!("policy started {starts} times"));
        }
        if session.phase() != HandshakePhase::PolicyStarted {
            return Err(format!("expected PolicyStarted, got {:?}", session.phase()));
        }
        Ok(())
    })
}

/// Create an oracle that verifies the policy manager was never started.
pub fn policy_not_started() -> OracleFn {
    Box::new(|world| {
        let session_id = world.session().session_id();
        match world.policy().starts(session_id) {
            0 => Ok(()),
            starts => Err(format!("policy started {starts} times, expected none")),
        }
    })
}

/// Create an oracle that verifies the exchange took at most `max` rounds.
pub fn rounds_at_most(max: usize) -> OracleFn {
    Box::new(move |world| {
        if world.rounds() <= max {
            Ok(())
        } else {
            Err(format!("exchange took {} rounds, expected at most {max}", world.rounds()))
        }
    })
}

/// Combine multiple oracles into one.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| {
        for oracle in oracles {
            oracle(world)?;
        }
        Ok(())
    })
}
