//! Error types for the posture vocabulary.

use thiserror::Error;

/// Errors raised when converting raw wire numbers into typed vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A numeric code has no meaning for the given enumeration
    #[error("unknown {kind} code: {value}")]
    UnknownCode {
        /// Name of the enumeration that was being decoded
        kind: &'static str,
        /// Raw value received
        value: u32,
    },
}

/// Convenient Result type alias for vocabulary conversions
pub type Result<T> = std::result::Result<T, ProtocolError>;
