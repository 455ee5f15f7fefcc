//! Error types for the verifier context.
//!
//! Posture findings are never errors: non-compliant endpoints and protocol
//! violations by the peer end up as recommendations. The errors here cover
//! misuse by the host (unknown connections, version mismatch) and failing
//! collaborators.

use thiserror::Error;

use crate::{ConnectionId, storage::StorageError};

/// Errors returned by [`Verifier`](crate::Verifier) entry points
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    /// The host's supported API range does not include ours
    #[error("no common IF-IMV version: host offers {min}..={max}, verifier speaks {ours}")]
    NoCommonVersion {
        /// Lowest version the host supports
        min: u32,
        /// Highest version the host supports
        max: u32,
        /// Version this verifier speaks
        ours: u32,
    },

    /// No session exists for this connection
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// A session already exists for this connection
    #[error("connection already exists: {0}")]
    DuplicateConnection(ConnectionId),

    /// Storage collaborator failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl VerifierError {
    /// Returns true if the host should treat this as a fatal result.
    ///
    /// Version mismatches only reject this verifier; everything else
    /// indicates a broken host/verifier contract.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VerifierError::NoCommonVersion { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_mismatch_is_not_fatal() {
        assert!(!VerifierError::NoCommonVersion { min: 2, max: 3, ours: 1 }.is_fatal());
        assert!(VerifierError::UnknownConnection(9).is_fatal());
        assert!(VerifierError::Storage(StorageError::UnknownSession(4)).is_fatal());
    }

    #[test]
    fn messages_are_actionable() {
        assert_eq!(
            VerifierError::NoCommonVersion { min: 2, max: 3, ours: 1 }.to_string(),
            "no common IF-IMV version: host offers 2..=3, verifier speaks 1"
        );
    }
}
