//! Message shapes exchanged with the host.

use serde::{Deserialize, Serialize};

use crate::{attribute::Attribute, pen::Pen};

/// PA subtype for operating-system posture messages
pub const PA_SUBTYPE_IETF_OPERATING_SYSTEM: u32 = 1;

/// PA-TNC message type: vendor id plus vendor-scoped subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageType {
    /// Vendor id
    pub vendor_id: u32,
    /// Subtype
    pub subtype: u32,
}

impl MessageType {
    /// IETF operating-system message type
    pub const OPERATING_SYSTEM: Self =
        Self { vendor_id: Pen::Ietf.to_u32(), subtype: PA_SUBTYPE_IETF_OPERATING_SYSTEM };

    /// Build a message type from raw numbers
    #[must_use]
    pub const fn new(vendor_id: u32, subtype: u32) -> Self {
        Self { vendor_id, subtype }
    }
}

impl Default for MessageType {
    fn default() -> Self {
        Self::OPERATING_SYSTEM
    }
}

/// A message as handed over by the host after decoding.
///
/// `fatal_error` is set when the decoder hit a local error or the peer
/// reported a fatal PA-TNC error. In that case `attributes` must not be
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message type the peer used
    pub msg_type: MessageType,
    /// Decoded attributes in arrival order
    pub attributes: Vec<Attribute>,
    /// Decoding reported a fatal local or remote error
    pub fatal_error: bool,
}

impl InboundMessage {
    /// Operating-system message carrying the given attributes
    #[must_use]
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { msg_type: MessageType::OPERATING_SYSTEM, attributes, fatal_error: false }
    }

    /// Operating-system message whose decoding failed fatally
    #[must_use]
    pub fn fatal() -> Self {
        Self { msg_type: MessageType::OPERATING_SYSTEM, attributes: Vec::new(), fatal_error: true }
    }
}
