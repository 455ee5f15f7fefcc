//! Storage collaborator.
//!
//! The verifier never owns persistent state beyond its in-memory session
//! records. Sessions, products, devices and package knowledge live behind
//! the [`Storage`] trait.
//!
//! # Implementations
//!
//! - [`MemoryStorage`]: in-memory package database for tests and simulation
//!
//! # Contract
//!
//! All calls are synchronous and complete within the verifier invocation
//! that made them. `check_packages` is the only call whose failure changes
//! the verdict; failures of the bookkeeping writes are logged and the
//! handshake continues.

mod memory;

pub use memory::{MemoryStorage, PackageVersion, StoredSession};
use posture_proto::{OsInfo, Package};
use thiserror::Error;

use crate::{
    ConnectionId, DeviceId, SessionId,
    session::{OsSettings, PackageCounts},
};

/// Errors reported by the storage collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Session handle is not known to storage
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// Package check attempted before the OS identity was known
    #[error("operating system identity not yet known")]
    MissingIdentity,

    /// No package database exists for this product
    #[error("unknown product: {0}")]
    UnknownProduct(String),

    /// Backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// Storage collaborator consumed by the verifier
pub trait Storage {
    /// Open a storage session for a new connection
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Backend` if the session cannot be recorded.
    fn add_session(&self, connection_id: ConnectionId) -> Result<SessionId, StorageError>;

    /// Record the accepted OS identity of a session
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnknownSession` if the session does not exist.
    fn add_product(&self, session_id: SessionId, os: &OsInfo) -> Result<(), StorageError>;

    /// Record a raw device identifier and return its device handle
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnknownSession` if the session does not exist.
    fn add_device(&self, session_id: SessionId, raw_id: &[u8]) -> Result<DeviceId, StorageError>;

    /// Classify an installed-packages inventory.
    ///
    /// # Errors
    ///
    /// Any error is a hard failure: the verifier stops evaluating the
    /// session and reports an error verdict.
    fn check_packages(
        &self,
        session_id: SessionId,
        os: Option<&OsInfo>,
        packages: &[Package],
    ) -> Result<PackageCounts, StorageError>;

    /// Persist the final posture summary of a session
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnknownSession` if the session does not exist.
    fn set_device_info(
        &self,
        session_id: SessionId,
        counts: &PackageCounts,
        settings: OsSettings,
    ) -> Result<(), StorageError>;
}
