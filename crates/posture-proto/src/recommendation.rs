//! Verdict vocabulary (TCG TNC IF-IMV 1.3, section 3.5).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::{ProtocolError, Result};

/// Access action recommended to the decision point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum ActionRecommendation {
    /// Grant access
    Allow = 0,
    /// Deny access
    NoAccess = 1,
    /// Grant restricted access
    Isolate = 2,
    /// No recommendation possible
    NoRecommendation = 3,
}

/// Evaluation of the endpoint's posture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum EvaluationResult {
    /// Fully compliant
    Compliant = 0,
    /// Minor deviations found
    NoncompliantMinor = 1,
    /// Major deviations found
    NoncompliantMajor = 2,
    /// Evaluation failed
    Error = 3,
    /// Evaluation not (yet) possible
    DontKnow = 4,
}

/// The (action, evaluation) pair returned to the access decision point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recommendation {
    /// Recommended action
    pub action: ActionRecommendation,
    /// Posture evaluation
    pub evaluation: EvaluationResult,
}

impl Recommendation {
    /// Compliant endpoint
    pub const ALLOW: Self =
        Self { action: ActionRecommendation::Allow, evaluation: EvaluationResult::Compliant };

    /// Endpoint with minor posture deviations
    pub const ISOLATE: Self = Self {
        action: ActionRecommendation::Isolate,
        evaluation: EvaluationResult::NoncompliantMinor,
    };

    /// Evaluation failed
    pub const ERROR: Self = Self {
        action: ActionRecommendation::NoRecommendation,
        evaluation: EvaluationResult::Error,
    };

    /// Nothing known yet
    pub const UNKNOWN: Self = Self {
        action: ActionRecommendation::NoRecommendation,
        evaluation: EvaluationResult::DontKnow,
    };
}

impl Default for Recommendation {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.action, self.evaluation)
    }
}

/// Connection states reported by the host (IF-IMV 1.3, section 3.8.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum ConnectionState {
    /// Connection created
    Create = 0,
    /// Handshake in progress
    Handshake = 1,
    /// Access granted
    AccessAllowed = 2,
    /// Restricted access granted
    AccessIsolated = 3,
    /// Access denied
    AccessNone = 4,
    /// Connection deleted
    Delete = 5,
}

impl TryFrom<u32> for ConnectionState {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Create),
            1 => Ok(Self::Handshake),
            2 => Ok(Self::AccessAllowed),
            3 => Ok(Self::AccessIsolated),
            4 => Ok(Self::AccessNone),
            5 => Ok(Self::Delete),
            _ => Err(ProtocolError::UnknownCode { kind: "connection state", value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_recommendation_is_unknown() {
        assert_eq!(Recommendation::default(), Recommendation::UNKNOWN);
        assert_eq!(Recommendation::ERROR.to_string(), "NoRecommendation/Error");
    }

    #[test]
    fn connection_state_codes() {
        assert_eq!(ConnectionState::try_from(5), Ok(ConnectionState::Delete));
        assert!(ConnectionState::try_from(6).is_err());
    }
}
