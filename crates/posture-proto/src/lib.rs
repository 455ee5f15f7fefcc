//! # Posture Protocol: Attribute Vocabulary
//!
//! This crate defines the closed set of posture attributes exchanged between
//! an endpoint's operating-system posture collector and the verifier that
//! judges it.
//!
//! ## Scope
//!
//! Attributes arrive here already decoded. Byte-level framing and the
//! envelope/session transport are owned by the host, so this crate only
//! describes:
//!
//! - **Namespaces**: vendor ids ([`Pen`]) and the attribute type numbers
//!   defined under each ([`IetfAttr`], [`ItaAttr`])
//! - **Values**: the decoded payload shapes ([`AttributeValue`])
//! - **Messages**: what the host hands the verifier ([`InboundMessage`])
//! - **Verdicts**: the (action, evaluation) pair returned to the access
//!   decision point ([`Recommendation`])
//!
//! ## Forward Compatibility
//!
//! Newer peers may send attribute types this crate does not know. Every
//! lookup from a raw number is total and returns `Option`, so unknown pairs
//! survive decoding as [`AttributeType`] values and can be ignored by the
//! verifier instead of rejected.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attribute;
pub mod errors;
pub mod message;
pub mod os;
pub mod pen;
pub mod recommendation;

pub use attribute::{
    Attribute, AttributeValue, FwdStatus, OpResult, OpStatus, Package, Setting,
};
pub use errors::{ProtocolError, Result};
pub use message::{InboundMessage, MessageType};
pub use os::{OsInfo, OsType};
pub use pen::{AttrKind, AttributeType, IetfAttr, ItaAttr, Pen};
pub use recommendation::{
    ActionRecommendation, ConnectionState, EvaluationResult, Recommendation,
};
