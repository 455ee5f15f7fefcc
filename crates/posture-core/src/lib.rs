//! Posture verifier core logic
//!
//! This crate contains the pure state machine logic of an operating-system
//! posture verifier. It is completely decoupled from I/O: the host feeds it
//! decoded messages and batch boundaries, and it answers with actions.
//!
//! # Architecture
//!
//! ```text
//!   host (TNC server)
//!      │ connection change / message / batch ending / solicit
//!      ↓
//! ┌────────────────────────────────────────────┐
//! │ Verifier                                   │
//! │  ├─ classifier  (attribute → fact)         │
//! │  ├─ session     (per-connection record)    │
//! │  ├─ handshake   (batch-boundary sequencer) │
//! │  ├─ request     (missing-attribute list)   │
//! │  └─ assessment  (gate + verdict)           │
//! └────────────────────────────────────────────┘
//!      │ Vec<VerifierAction>        │ Storage / PolicyManager
//!      ↓                            ↓
//!   driver sends messages      collaborators
//! ```
//!
//! # Key Principles
//!
//! - No I/O in Core: outbound messages and verdicts are returned as
//!   [`action::VerifierAction`] values for the driver to execute
//! - Explicit context: a [`verifier::Verifier`] is constructed and torn down
//!   by its owner; there is no process-global state
//! - At most one verdict: once a session is assessed its recommendation is
//!   frozen
//!
//! # Modules
//!
//! - [`verifier`]: Context object and host entry points
//! - [`session`]: Session Posture Record
//! - [`classifier`]: Attribute classification and intake
//! - [`handshake`]: Batch-boundary state machine
//! - [`request`]: Missing-attribute request builder
//! - [`assessment`]: Assessment gate and recommendation
//! - [`storage`]: Storage collaborator
//! - [`policy`]: Policy-trigger collaborator
//! - [`config`]: Verifier configuration
//! - [`error`]: Error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod action;
pub mod assessment;
pub mod classifier;
pub mod config;
pub mod error;
pub mod handshake;
pub mod policy;
pub mod request;
pub mod session;
pub mod storage;
pub mod verifier;

pub use action::VerifierAction;
pub use config::VerifierConfig;
pub use error::VerifierError;
pub use verifier::Verifier;

/// Host-assigned connection handle
pub type ConnectionId = u32;

/// Verifier instance id assigned by the host
pub type ImvId = u32;

/// Storage session handle
pub type SessionId = u64;

/// Storage device handle
pub type DeviceId = u64;
