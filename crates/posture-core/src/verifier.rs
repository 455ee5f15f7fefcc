//! Verifier context
//!
//! Owns the per-connection posture records and routes host events to the
//! classifier, the handshake sequencer and the assessment gate.
//!
//! ## Architecture
//!
//! ```text
//! Host
//!   ├─ notify_connection_change ─→ session table (create / update / delete)
//!   ├─ receive_message ──────────→ classifier → assessment gate
//!   ├─ batch_ending ─────────────→ handshake sequencer
//!   └─ solicit_recommendation ───→ current verdict
//! ```
//!
//! ## Design Decisions
//!
//! - **Explicit context**: constructed by `initialize`, consumed by
//!   `terminate`
//! - **Sans-IO**: every entry point returns actions for the driver
//! - **Generic collaborators**: storage and policy are traits so tests can
//!   inspect what the verifier wrote

use std::collections::HashMap;

use posture_proto::{ConnectionState, InboundMessage, Recommendation};
use tracing::{debug, info, warn};

use crate::{
    ConnectionId, ImvId,
    action::VerifierAction,
    assessment, classifier,
    config::VerifierConfig,
    error::VerifierError,
    handshake,
    policy::PolicyManager,
    session::PostureSession,
    storage::Storage,
};

/// Operating-system posture verifier
pub struct Verifier<S, P>
where
    S: Storage,
    P: PolicyManager,
{
    imv_id: ImvId,
    version: u32,
    config: VerifierConfig,
    storage: S,
    policy: P,
    sessions: HashMap<ConnectionId, PostureSession>,
}

impl<S, P> Verifier<S, P>
where
    S: Storage,
    P: PolicyManager,
{
    /// Negotiate the IF-IMV version and create the context.
    ///
    /// # Errors
    ///
    /// Returns `VerifierError::NoCommonVersion` if `min_version..=max_version`
    /// does not contain `config.if_imv_version`.
    pub fn initialize(
        imv_id: ImvId,
        min_version: u32,
        max_version: u32,
        config: VerifierConfig,
        storage: S,
        policy: P,
    ) -> Result<Self, VerifierError> {
        let ours = config.if_imv_version;
        if min_version > ours || max_version < ours {
            warn!(
                imv = %config.name,
                imv_id,
                min_version,
                max_version,
                "no common IF-IMV version"
            );
            return Err(VerifierError::NoCommonVersion { min: min_version, max: max_version, ours });
        }

        info!(imv = %config.name, imv_id, version = ours, "verifier initialized");

        Ok(Self { imv_id, version: ours, config, storage, policy, sessions: HashMap::new() })
    }

    /// Host-assigned id of this verifier
    pub fn imv_id(&self) -> ImvId {
        self.imv_id
    }

    /// Negotiated IF-IMV version
    pub fn actual_version(&self) -> u32 {
        self.version
    }

    /// Active configuration
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Storage collaborator
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Policy collaborator
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Posture record of a connection
    pub fn session(&self, connection_id: ConnectionId) -> Option<&PostureSession> {
        self.sessions.get(&connection_id)
    }

    /// Number of open connections
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// React to a connection state change reported by the host.
    ///
    /// # Errors
    ///
    /// - `VerifierError::DuplicateConnection` on `Create` for a known
    ///   connection
    /// - `VerifierError::UnknownConnection` on any other state for an
    ///   unknown connection
    /// - `VerifierError::Storage` if storage cannot open a session
    pub fn notify_connection_change(
        &mut self,
        connection_id: ConnectionId,
        state: ConnectionState,
    ) -> Result<(), VerifierError> {
        match state {
            ConnectionState::Create => {
                if self.sessions.contains_key(&connection_id) {
                    return Err(VerifierError::DuplicateConnection(connection_id));
                }
                let session_id = self.storage.add_session(connection_id)?;
                debug!(connection_id, session_id, "connection created");
                self.sessions.insert(connection_id, PostureSession::new(connection_id, session_id));
            },
            ConnectionState::Delete => {
                let session = self
                    .sessions
                    .remove(&connection_id)
                    .ok_or(VerifierError::UnknownConnection(connection_id))?;
                self.policy.policy_script(session.session_id(), false);
                debug!(connection_id, "connection deleted");
            },
            other => {
                let session = self.session_mut(connection_id)?;
                session.set_connection_state(other);
                debug!(connection_id, state = ?other, "connection state changed");
            },
        }
        Ok(())
    }

    /// Process one inbound PA-TNC message.
    ///
    /// # Errors
    ///
    /// Returns `VerifierError::UnknownConnection` if the connection was
    /// never created.
    pub fn receive_message(
        &mut self,
        connection_id: ConnectionId,
        message: &InboundMessage,
    ) -> Result<Vec<VerifierAction>, VerifierError> {
        let msg_type = self.config.msg_type;
        let session = self
            .sessions
            .get_mut(&connection_id)
            .ok_or(VerifierError::UnknownConnection(connection_id))?;

        if message.msg_type != msg_type {
            debug!(
                connection_id,
                vendor_id = message.msg_type.vendor_id,
                subtype = message.msg_type.subtype,
                "ignoring message of foreign type"
            );
            return Ok(Vec::new());
        }

        if session.is_assessed() {
            debug!(connection_id, "message after assessment ignored");
            return Ok(Vec::new());
        }

        if message.fatal_error {
            warn!(connection_id, "peer reported a fatal PA-TNC error");
            return Ok(assessment::conclude(session, Recommendation::ERROR));
        }

        let intake = classifier::absorb(session, &message.attributes, &self.storage, &self.config);
        if intake.hard_failure {
            return Ok(assessment::conclude(session, Recommendation::ERROR));
        }

        Ok(assessment::try_assess(session, &self.storage))
    }

    /// The host finished delivering a batch of messages.
    ///
    /// # Errors
    ///
    /// Returns `VerifierError::UnknownConnection` if the connection was
    /// never created.
    pub fn batch_ending(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<Vec<VerifierAction>, VerifierError> {
        let session = self
            .sessions
            .get_mut(&connection_id)
            .ok_or(VerifierError::UnknownConnection(connection_id))?;
        Ok(handshake::batch_ending(session, &self.storage, &self.policy))
    }

    /// The host demands a recommendation now.
    ///
    /// Provides whatever the session currently holds and freezes it. An
    /// already fixed verdict is provided again unchanged.
    ///
    /// # Errors
    ///
    /// Returns `VerifierError::UnknownConnection` if the connection was
    /// never created.
    pub fn solicit_recommendation(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<Vec<VerifierAction>, VerifierError> {
        let session = self.session_mut(connection_id)?;

        let recommendation = session.recommendation();
        if session.conclude(recommendation) {
            info!(connection_id, %recommendation, "recommendation solicited before assessment");
        }

        Ok(vec![VerifierAction::ProvideRecommendation { connection_id, recommendation }])
    }

    /// Tear down the context.
    ///
    /// Remaining sessions are finished as if their connections were deleted.
    pub fn terminate(self) {
        let mut remaining: Vec<_> = self.sessions.into_values().collect();
        remaining.sort_by_key(PostureSession::connection_id);

        for session in &remaining {
            self.policy.policy_script(session.session_id(), false);
        }

        info!(
            imv = %self.config.name,
            imv_id = self.imv_id,
            closed = remaining.len(),
            "verifier terminated"
        );
    }

    fn session_mut(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<&mut PostureSession, VerifierError> {
        self.sessions.get_mut(&connection_id).ok_or(VerifierError::UnknownConnection(connection_id))
    }
}
