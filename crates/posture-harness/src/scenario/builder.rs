//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use posture_core::{
    Verifier, VerifierAction, VerifierConfig, policy::RecordingPolicy, storage::MemoryStorage,
};
use posture_proto::{AttributeType, ConnectionState, InboundMessage};

use crate::{
    collector::Collector,
    faults::FaultInjector,
    scenario::{OracleFn, World, world::CONNECTION_ID},
};

/// Rounds after which an exchange is cut short
pub const DEFAULT_MAX_ROUNDS: usize = 8;

/// Scenario builder.
///
/// Construct a scenario by configuring the collector, the verifier's package
/// database and optional faults, then add an oracle verification function.
pub struct Scenario {
    collector: Collector,
    config: VerifierConfig,
    storage: MemoryStorage,
    faults: Option<FaultInjector>,
    max_rounds: usize,
}

impl Scenario {
    /// Create a new scenario with a default collector and an empty package
    /// database for Debian 7.0.
    pub fn new() -> Self {
        let storage = MemoryStorage::new();
        storage.add_product_database("Debian 7.0");
        Self {
            collector: Collector::new(),
            config: VerifierConfig::default(),
            storage,
            faults: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Configure the simulated endpoint.
    pub fn with_collector(mut self, collector: Collector) -> Self {
        self.collector = collector;
        self
    }

    /// Configure the verifier.
    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this storage (and its package database) instead of the default.
    pub fn with_storage(mut self, storage: MemoryStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Inject faults into every collector message.
    pub fn with_faults(mut self, faults: FaultInjector) -> Self {
        self.faults = Some(faults);
        self
    }

    /// Stop exchanging messages after this many rounds.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// Each round delivers one collector message followed by a batch
    /// boundary:
    /// 1. Round 0 carries whatever the collector volunteers
    /// 2. Later rounds carry its answers to the previous round's requests,
    ///    or its unsolicited follow-up if nothing was requested
    /// 3. The exchange stops at a verdict, when nothing was requested and
    ///    the collector has nothing left to say, or at the round limit
    ///
    /// Without a verdict the host then solicits one. Finally the connection
    /// is deleted, the verifier terminated, and the oracle invoked.
    pub fn run(self) -> Result<(), String> {
        let Scenario { mut collector, config, storage, mut faults, max_rounds } = self.scenario;
        let policy = RecordingPolicy::new();
        let mut world = World::new(storage.clone(), policy.clone());

        let mut verifier = Verifier::initialize(1, 1, 1, config, storage, policy)
            .map_err(|e| format!("initialize failed: {e}"))?;
        verifier
            .notify_connection_change(CONNECTION_ID, ConnectionState::Create)
            .map_err(|e| format!("create failed: {e}"))?;

        let mut pending: Vec<AttributeType> = Vec::new();

        for round in 0..max_rounds {
            let attributes = if round == 0 {
                collector.first_message()
            } else if pending.is_empty() {
                collector.follow_up()
            } else {
                collector.respond(&pending)
            };

            let idle = pending.is_empty() && attributes.is_empty();
            if round > 0 && idle && !collector.fails_in_round(round) {
                break;
            }

            let message = if collector.fails_in_round(round) {
                InboundMessage::fatal()
            } else {
                let attributes = match faults.as_mut() {
                    Some(faults) => faults.apply(attributes),
                    None => attributes,
                };
                InboundMessage::new(attributes)
            };

            world.record_round();
            let actions = verifier
                .receive_message(CONNECTION_ID, &message)
                .map_err(|e| format!("round {round}: receive_message failed: {e}"))?;
            world.record_actions(actions);

            let actions = verifier
                .batch_ending(CONNECTION_ID)
                .map_err(|e| format!("round {round}: batch_ending failed: {e}"))?;
            pending = requested(&actions);
            world.record_actions(actions);

            if world.verdict().is_some() {
                break;
            }
        }

        if world.verdict().is_none() {
            let actions = verifier
                .solicit_recommendation(CONNECTION_ID)
                .map_err(|e| format!("solicit_recommendation failed: {e}"))?;
            world.record_solicit();
            world.record_actions(actions);
        }

        let session = verifier
            .session(CONNECTION_ID)
            .cloned()
            .ok_or_else(|| "session vanished before delete".to_string())?;
        world.set_session(session);

        verifier
            .notify_connection_change(CONNECTION_ID, ConnectionState::Delete)
            .map_err(|e| format!("delete failed: {e}"))?;
        verifier.terminate();

        (self.oracle)(&world)?;

        Ok(())
    }
}

/// Union of attribute types requested by these actions, in request order
fn requested(actions: &[VerifierAction]) -> Vec<AttributeType> {
    let mut types: Vec<AttributeType> = Vec::new();
    for &ty in actions.iter().filter_map(VerifierAction::requested_types).flatten() {
        if !types.contains(&ty) {
            types.push(ty);
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_requires_oracle() {
        // This should compile - oracle provided
        let _scenario = Scenario::new().oracle(Box::new(|_world| Ok(())));
    }

    #[test]
    fn scenario_creates_session() {
        let scenario = Scenario::new().oracle(Box::new(|world| {
            let _session = world.session();
            if world.rounds() == 0 {
                return Err("no round delivered".to_string());
            }
            Ok(())
        }));

        scenario.run().expect("scenario should succeed");
    }

    #[test]
    fn oracle_failure_is_reported() {
        let result = Scenario::new().oracle(Box::new(|_world| Err("boom".to_string()))).run();
        assert_eq!(result, Err("boom".to_string()));
    }
}
