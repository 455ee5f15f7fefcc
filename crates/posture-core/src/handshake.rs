//! Handshake sequencer.
//!
//! Runs once per batch boundary and decides whether to request attributes,
//! start the package-verification phase, or give up on the peer.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ batch end ┌────────────────────┐ batch end ┌───────────────┐
//! │ Init │──────────>│ AttributeRequested │──────────>│ PolicyStarted │
//! └──────┘           └────────────────────┘           └───────────────┘
//!    │  identity + device id       │ identity still missing
//!    │                             ↓
//!    │                      (NoRecommendation, Error)
//!    └─────────────────────────────────────────────────────────>│
//! ```
//!
//! # Forgiveness Window
//!
//! The peer gets two rounds to deliver Product Information and String
//! Version: whatever it volunteers before the first batch boundary, and its
//! answer to the attribute request sent at that boundary. The device id only
//! blocks the first round. After one request cycle it is no longer awaited.
//!
//! # Transitions
//!
//! | Phase | Condition | Effect |
//! |---|---|---|
//! | Init | not everything received | send attribute request (phase unchanged by this step) |
//! | Init / AttributeRequested | identity received and (device id received or phase is AttributeRequested) | trigger policy, request packages exclusively, → PolicyStarted |
//! | AttributeRequested | otherwise | error verdict |
//! | Init | otherwise | → AttributeRequested |
//! | PolicyStarted | always | re-check the assessment gate |

use posture_proto::Recommendation;
use tracing::info;

use crate::{
    action::VerifierAction,
    assessment,
    policy::PolicyManager,
    request,
    session::{HandshakePhase, PostureSession, ReceivedAttributes},
    storage::Storage,
};

/// React to the end of a message batch
///
/// # Invariants
///
/// - **Post**: the phase is never lower than before the call
/// - **Post**: the policy manager is triggered at most once per session
pub fn batch_ending(
    session: &mut PostureSession,
    storage: &impl Storage,
    policy: &impl PolicyManager,
) -> Vec<VerifierAction> {
    if session.is_assessed() {
        return Vec::new();
    }

    let connection_id = session.connection_id();
    let phase = session.phase();
    let received = session.received();

    if phase == HandshakePhase::PolicyStarted {
        return assessment::try_assess(session, storage);
    }

    let mut actions = Vec::new();

    if phase == HandshakePhase::Init && received != ReceivedAttributes::all() {
        let attr = request::build_attribute_request(received);
        info!(connection_id, missing = ?received.complement(), "requesting missing attributes");
        actions.push(VerifierAction::SendAttributes {
            connection_id,
            attributes: vec![attr],
            exclusive: false,
        });
    }

    let identity = received.contains(ReceivedAttributes::IDENTITY);
    let device_settled = received.contains(ReceivedAttributes::DEVICE_ID)
        || phase == HandshakePhase::AttributeRequested;

    if identity && device_settled {
        policy.policy_script(session.session_id(), true);
        session.advance(HandshakePhase::PolicyStarted);
        info!(connection_id, "policy started, requesting installed packages");

        actions.push(VerifierAction::SendAttributes {
            connection_id,
            attributes: vec![request::build_packages_request()],
            exclusive: true,
        });
        return actions;
    }

    if phase == HandshakePhase::AttributeRequested {
        info!(
            connection_id,
            received = ?received,
            "product information and string version still missing"
        );
        actions.extend(assessment::conclude(session, Recommendation::ERROR));
        return actions;
    }

    session.advance(HandshakePhase::AttributeRequested);
    actions
}
