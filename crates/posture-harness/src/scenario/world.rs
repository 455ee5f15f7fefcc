//! World state for scenario execution.
//!
//! The World records everything one verifier/collector exchange produced:
//! every action in emission order, the round count, the final posture record
//! and handles to the collaborators. Oracles read it after the run.

use posture_core::{
    ConnectionId, VerifierAction, policy::RecordingPolicy, session::PostureSession,
    storage::MemoryStorage,
};
use posture_proto::{AttributeType, Recommendation};

/// Connection id used for the single simulated endpoint
pub const CONNECTION_ID: ConnectionId = 1;

/// World state of a finished (or running) scenario
pub struct World {
    actions: Vec<VerifierAction>,
    rounds: usize,
    solicited: bool,
    session: Option<PostureSession>,
    storage: MemoryStorage,
    policy: RecordingPolicy,
}

impl World {
    pub(crate) fn new(storage: MemoryStorage, policy: RecordingPolicy) -> Self {
        Self { actions: Vec::new(), rounds: 0, solicited: false, session: None, storage, policy }
    }

    pub(crate) fn record_actions(&mut self, actions: Vec<VerifierAction>) {
        self.actions.extend(actions);
    }

    pub(crate) fn record_round(&mut self) {
        self.rounds += 1;
    }

    pub(crate) fn record_solicit(&mut self) {
        self.solicited = true;
    }

    pub(crate) fn set_session(&mut self, session: PostureSession) {
        self.session = Some(session);
    }

    /// All actions in emission order
    pub fn actions(&self) -> &[VerifierAction] {
        &self.actions
    }

    /// Every provided recommendation in emission order
    pub fn verdicts(&self) -> Vec<Recommendation> {
        self.actions.iter().filter_map(VerifierAction::verdict).collect()
    }

    /// Number of `SendAssessment` actions
    pub fn assessments(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action, VerifierAction::SendAssessment { .. }))
            .count()
    }

    /// Attribute types asked for, one entry per request
    pub fn requests(&self) -> Vec<Vec<AttributeType>> {
        self.actions
            .iter()
            .filter_map(VerifierAction::requested_types)
            .map(<[AttributeType]>::to_vec)
            .collect()
    }

    /// Whether any request asked for `ty`
    pub fn requested(&self, ty: AttributeType) -> bool {
        self.requests().iter().any(|types| types.contains(&ty))
    }

    /// First provided recommendation
    pub fn verdict(&self) -> Option<Recommendation> {
        self.verdicts().first().copied()
    }

    /// Number of message rounds delivered to the verifier
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Whether the run ended with a host-forced recommendation
    pub fn solicited(&self) -> bool {
        self.solicited
    }

    /// Posture record as it stood before the connection was deleted
    ///
    /// # Panics
    ///
    /// Panics if the scenario never created the connection.
    pub fn session(&self) -> &PostureSession {
        self.session.as_ref().expect("no session in world")
    }

    /// Storage the verifier wrote to
    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }

    /// Policy notifications the verifier sent
    pub fn policy(&self) -> &RecordingPolicy {
        &self.policy
    }
}
