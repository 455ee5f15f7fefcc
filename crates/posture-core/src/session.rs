//! Session Posture Record.
//!
//! One record exists per connection. It accumulates everything learned about
//! the endpoint across message rounds and carries the handshake phase.
//!
//! # Invariants
//!
//! - `phase` only moves forward: `Init → AttributeRequested → PolicyStarted`
//! - `received` and `settings` only grow
//! - `assessed` flips from `false` to `true` at most once, and once set the
//!   stored recommendation never changes

use bitflags::bitflags;
use posture_proto::{ConnectionState, OsInfo, Recommendation};
use serde::{Deserialize, Serialize};

use crate::{ConnectionId, DeviceId, SessionId};

bitflags! {
    /// Fact kinds observed during this session
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ReceivedAttributes: u8 {
        /// IETF Product Information
        const PRODUCT_INFORMATION = 0b0000_0001;
        /// IETF String Version
        const STRING_VERSION = 0b0000_0010;
        /// IETF Numeric Version
        const NUMERIC_VERSION = 0b0000_0100;
        /// IETF Operational Status
        const OPERATIONAL_STATUS = 0b0000_1000;
        /// IETF Forwarding Enabled
        const FORWARDING_ENABLED = 0b0001_0000;
        /// IETF Factory Default Password Enabled
        const DEFAULT_PASSWORD_ENABLED = 0b0010_0000;
        /// ITA Device ID
        const DEVICE_ID = 0b0100_0000;
    }
}

impl ReceivedAttributes {
    /// Both halves of the OS identity
    pub const IDENTITY: Self =
        Self::PRODUCT_INFORMATION.union(Self::STRING_VERSION);
}

bitflags! {
    /// Risky operating-system settings found on the endpoint
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct OsSettings: u8 {
        /// IP forwarding is enabled
        const FWD_ENABLED = 0b0000_0001;
        /// Factory default password is still active
        const DEFAULT_PWD_ENABLED = 0b0000_0010;
        /// Apps from outside the official market may be installed
        const NON_MARKET_APPS = 0b0000_0100;
    }
}

/// Coarse handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandshakePhase {
    /// Nothing decided yet
    Init,
    /// One batch boundary passed; identity is now mandatory
    AttributeRequested,
    /// Policy manager triggered and package inventory requested
    PolicyStarted,
}

/// Aggregate package classification counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageCounts {
    /// Packages processed
    pub total: u32,
    /// Packages with a newer security release available
    pub update: u32,
    /// Packages in a blacklisted version
    pub blacklist: u32,
    /// Packages in their latest good version
    pub ok: u32,
}

impl PackageCounts {
    /// Add another batch of counts
    pub fn merge(&mut self, other: &PackageCounts) {
        self.total = self.total.saturating_add(other.total);
        self.update = self.update.saturating_add(other.update);
        self.blacklist = self.blacklist.saturating_add(other.blacklist);
        self.ok = self.ok.saturating_add(other.ok);
    }

    /// Packages that the database does not know about
    #[must_use]
    pub fn not_found(&self) -> u32 {
        self.total
            .saturating_sub(self.update)
            .saturating_sub(self.blacklist)
            .saturating_sub(self.ok)
    }
}

/// Per-connection accumulator of posture facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostureSession {
    connection_id: ConnectionId,
    session_id: SessionId,
    connection_state: ConnectionState,
    phase: HandshakePhase,
    received: ReceivedAttributes,
    settings: OsSettings,
    os_info: Option<OsInfo>,
    device_id: Option<DeviceId>,
    angel_count: u32,
    counts: PackageCounts,
    recommendation: Recommendation,
    assessed: bool,
}

impl PostureSession {
    /// Create a fresh record in [`HandshakePhase::Init`]
    #[must_use]
    pub fn new(connection_id: ConnectionId, session_id: SessionId) -> Self {
        Self {
            connection_id,
            session_id,
            connection_state: ConnectionState::Create,
            phase: HandshakePhase::Init,
            received: ReceivedAttributes::empty(),
            settings: OsSettings::empty(),
            os_info: None,
            device_id: None,
            angel_count: 0,
            counts: PackageCounts::default(),
            recommendation: Recommendation::UNKNOWN,
            assessed: false,
        }
    }

    /// Host connection handle
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Storage session handle
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Last connection state reported by the host
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub(crate) fn set_connection_state(&mut self, state: ConnectionState) {
        self.connection_state = state;
    }

    /// Current handshake phase
    #[must_use]
    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    /// Advance the handshake phase.
    ///
    /// Requests to move backwards are ignored.
    pub(crate) fn advance(&mut self, phase: HandshakePhase) {
        debug_assert!(phase >= self.phase, "phase regression {:?} -> {:?}", self.phase, phase);
        if phase > self.phase {
            tracing::debug!(
                connection_id = self.connection_id,
                from = ?self.phase,
                to = ?phase,
                "handshake phase advanced"
            );
            self.phase = phase;
        }
    }

    /// Fact kinds observed so far
    #[must_use]
    pub fn received(&self) -> ReceivedAttributes {
        self.received
    }

    pub(crate) fn set_received(&mut self, kind: ReceivedAttributes) {
        self.received.insert(kind);
    }

    /// Risky settings found so far
    #[must_use]
    pub fn settings(&self) -> OsSettings {
        self.settings
    }

    pub(crate) fn set_settings(&mut self, settings: OsSettings) {
        self.settings.insert(settings);
    }

    /// Accepted OS identity
    #[must_use]
    pub fn os_info(&self) -> Option<&OsInfo> {
        self.os_info.as_ref()
    }

    pub(crate) fn set_os_info(&mut self, info: OsInfo) {
        self.os_info = Some(info);
    }

    /// Device handle assigned by storage
    #[must_use]
    pub fn device_id(&self) -> Option<DeviceId> {
        self.device_id
    }

    pub(crate) fn set_device_id(&mut self, device_id: DeviceId) {
        self.device_id = Some(device_id);
    }

    /// Number of helper processes currently running on the endpoint
    #[must_use]
    pub fn angel_count(&self) -> u32 {
        self.angel_count
    }

    pub(crate) fn angel_started(&mut self) {
        self.angel_count = self.angel_count.saturating_add(1);
    }

    /// Returns `false` if no angel was running.
    pub(crate) fn angel_stopped(&mut self) -> bool {
        match self.angel_count.checked_sub(1) {
            Some(count) => {
                self.angel_count = count;
                true
            },
            None => false,
        }
    }

    /// Accumulated package counts
    #[must_use]
    pub fn counts(&self) -> PackageCounts {
        self.counts
    }

    pub(crate) fn add_counts(&mut self, counts: &PackageCounts) {
        self.counts.merge(counts);
    }

    /// Current recommendation (`NoRecommendation/DontKnow` until assessed)
    #[must_use]
    pub fn recommendation(&self) -> Recommendation {
        self.recommendation
    }

    /// Whether the final verdict has been fixed
    #[must_use]
    pub fn is_assessed(&self) -> bool {
        self.assessed
    }

    /// Freeze the verdict.
    ///
    /// Returns `false` and leaves the record untouched if a verdict was
    /// already fixed.
    pub(crate) fn conclude(&mut self, recommendation: Recommendation) -> bool {
        if self.assessed {
            return false;
        }
        self.recommendation = recommendation;
        self.assessed = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_blank() {
        let session = PostureSession::new(7, 42);
        assert_eq!(session.phase(), HandshakePhase::Init);
        assert!(session.received().is_empty());
        assert!(session.settings().is_empty());
        assert_eq!(session.recommendation(), Recommendation::UNKNOWN);
        assert!(!session.is_assessed());
    }

    #[test]
    fn phase_never_regresses() {
        let mut session = PostureSession::new(1, 1);
        session.advance(HandshakePhase::PolicyStarted);
        assert_eq!(session.phase(), HandshakePhase::PolicyStarted);
        session.advance(HandshakePhase::PolicyStarted);
        assert_eq!(session.phase(), HandshakePhase::PolicyStarted);
    }

    #[test]
    fn angel_count_guards_at_zero() {
        let mut session = PostureSession::new(1, 1);
        assert!(!session.angel_stopped());
        assert_eq!(session.angel_count(), 0);

        session.angel_started();
        session.angel_started();
        assert!(session.angel_stopped());
        assert_eq!(session.angel_count(), 1);
    }

    #[test]
    fn verdict_is_frozen_after_conclude() {
        let mut session = PostureSession::new(1, 1);
        assert!(session.conclude(Recommendation::ALLOW));
        assert!(!session.conclude(Recommendation::ERROR));
        assert_eq!(session.recommendation(), Recommendation::ALLOW);
    }

    #[test]
    fn counts_merge_and_not_found() {
        let mut counts = PackageCounts { total: 4, update: 1, blacklist: 0, ok: 2 };
        counts.merge(&PackageCounts { total: 6, update: 1, blacklist: 1, ok: 3 });
        assert_eq!(counts, PackageCounts { total: 10, update: 2, blacklist: 1, ok: 5 });
        assert_eq!(counts.not_found(), 2);
    }

    #[test]
    fn identity_is_the_pair() {
        assert!(ReceivedAttributes::IDENTITY.contains(ReceivedAttributes::PRODUCT_INFORMATION));
        assert!(ReceivedAttributes::IDENTITY.contains(ReceivedAttributes::STRING_VERSION));
        assert_eq!(ReceivedAttributes::all().bits(), 0b0111_1111);
    }
}
