//! Assessment gate and recommendation.
//!
//! # Flow
//!
//! 1. **Gate**: the session is in `PolicyStarted`, no angel is running and
//!    no verdict has been fixed yet
//! 2. **Persist**: package counts and settings go to storage
//! 3. **Evaluate**: any outdated or blacklisted package, or any risky
//!    setting, isolates the endpoint; otherwise it is allowed
//! 4. **Conclude**: the verdict is frozen and reported
//!
//! Hard failures skip steps 1 to 3 and conclude with an error verdict
//! directly.

use posture_proto::Recommendation;
use tracing::{info, warn};

use crate::{
    action::VerifierAction,
    session::{HandshakePhase, OsSettings, PackageCounts, PostureSession},
    storage::Storage,
};

/// Compute the verdict for the collected posture
#[must_use]
pub fn evaluate(counts: &PackageCounts, settings: OsSettings) -> Recommendation {
    if counts.update > 0 || counts.blacklist > 0 || !settings.is_empty() {
        Recommendation::ISOLATE
    } else {
        Recommendation::ALLOW
    }
}

/// Whether the session may be assessed now
#[must_use]
pub fn is_ready(session: &PostureSession) -> bool {
    session.phase() == HandshakePhase::PolicyStarted
        && session.angel_count() == 0
        && !session.is_assessed()
}

/// Freeze `recommendation` and report it.
///
/// Returns no actions if the session already carries a verdict.
pub fn conclude(
    session: &mut PostureSession,
    recommendation: Recommendation,
) -> Vec<VerifierAction> {
    let connection_id = session.connection_id();

    if !session.conclude(recommendation) {
        warn!(
            connection_id,
            kept = %session.recommendation(),
            dropped = %recommendation,
            "session already assessed, verdict unchanged"
        );
        return Vec::new();
    }

    info!(connection_id, %recommendation, "assessment complete");

    vec![
        VerifierAction::SendAssessment { connection_id, recommendation },
        VerifierAction::ProvideRecommendation { connection_id, recommendation },
    ]
}

/// Assess the session if the gate is open
pub fn try_assess(session: &mut PostureSession, storage: &impl Storage) -> Vec<VerifierAction> {
    if !is_ready(session) {
        return Vec::new();
    }

    let connection_id = session.connection_id();
    let counts = session.counts();
    let settings = session.settings();

    info!(
        connection_id,
        total = counts.total,
        not_updated = counts.update,
        blacklisted = counts.blacklist,
        ok = counts.ok,
        not_found = counts.not_found(),
        ?settings,
        "processed packages"
    );

    if let Err(e) = storage.set_device_info(session.session_id(), &counts, settings) {
        warn!(connection_id, error = %e, "failed to store device info");
    }

    conclude(session, evaluate(&counts, settings))
}
