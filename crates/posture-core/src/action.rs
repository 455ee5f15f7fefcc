//! Actions returned by the verifier.
//!
//! The driver (test harness or host adapter) executes these:
//! - `SendAttributes`: encode the attributes into a PA-TNC message and send it
//! - `SendAssessment`: announce that an assessment result exists
//! - `ProvideRecommendation`: hand the verdict to the decision point
//!
//! `SendAssessment` is always immediately followed by `ProvideRecommendation`
//! for the same connection.

use posture_proto::{Attribute, AttributeType, AttributeValue, Recommendation};

use crate::ConnectionId;

/// Side effects requested by the verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierAction {
    /// Send these attributes to the peer
    SendAttributes {
        /// Target connection
        connection_id: ConnectionId,
        /// Attributes to send
        attributes: Vec<Attribute>,
        /// No other attribute types may share this round
        exclusive: bool,
    },

    /// Announce the assessment to the peer
    SendAssessment {
        /// Target connection
        connection_id: ConnectionId,
        /// Verdict being announced
        recommendation: Recommendation,
    },

    /// Hand the verdict to the access decision point
    ProvideRecommendation {
        /// Target connection
        connection_id: ConnectionId,
        /// Final verdict
        recommendation: Recommendation,
    },
}

impl VerifierAction {
    /// Connection this action targets
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            Self::SendAttributes { connection_id, .. }
            | Self::SendAssessment { connection_id, .. }
            | Self::ProvideRecommendation { connection_id, .. } => *connection_id,
        }
    }

    /// Attribute types requested by this action, if it is an attribute request
    #[must_use]
    pub fn requested_types(&self) -> Option<&[AttributeType]> {
        let Self::SendAttributes { attributes, .. } = self else {
            return None;
        };
        attributes.iter().find_map(|attr| match &attr.value {
            AttributeValue::Request(types) => Some(types.as_slice()),
            _ => None,
        })
    }

    /// Verdict carried by a `ProvideRecommendation` action
    #[must_use]
    pub fn verdict(&self) -> Option<Recommendation> {
        match self {
            Self::ProvideRecommendation { recommendation, .. } => Some(*recommendation),
            _ => None,
        }
    }
}
