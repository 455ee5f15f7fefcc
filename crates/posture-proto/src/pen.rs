//! Attribute namespaces and type numbers.
//!
//! Every posture attribute is identified by a `(vendor id, type)` pair. The
//! vendor id is an IANA Private Enterprise Number (PEN); the type number is
//! scoped to that vendor.
//!
//! # Namespaces
//!
//! - `0x000000`: IETF standard attributes (RFC 5792)
//! - `0x00902a`: ITA vendor-specific attributes (settings, angels, device id)
//! - `0xffffff`: Reserved, used as the namespace of the attribute-request
//!   wrapper itself
//!
//! Unknown vendors and unknown type numbers are representable: an
//! [`AttributeType`] is just two raw integers, and [`AttributeType::kind`]
//! returns `None` when the pair is outside the known vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::{ProtocolError, Result};

/// Private Enterprise Numbers used by the posture protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum Pen {
    /// IETF standard namespace
    Ietf = 0x00_0000,
    /// Trusted Computing Group
    Tcg = 0x00_5597,
    /// Institute for Internet Technologies and Applications
    Ita = 0x00_902a,
    /// Reserved namespace
    Reserved = 0xff_ffff,
}

impl Pen {
    /// Convert to raw vendor id
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Convert from raw vendor id
    ///
    /// Returns `None` for vendors outside the known set.
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x00_0000 => Some(Self::Ietf),
            0x00_5597 => Some(Self::Tcg),
            0x00_902a => Some(Self::Ita),
            0xff_ffff => Some(Self::Reserved),
            _ => None,
        }
    }

    /// Short display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ietf => "IETF",
            Self::Tcg => "TCG",
            Self::Ita => "ITA",
            Self::Reserved => "Reserved",
        }
    }
}

impl TryFrom<u32> for Pen {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self> {
        Self::from_u32(value).ok_or(ProtocolError::UnknownCode { kind: "pen", value })
    }
}

/// IETF standard attribute types (RFC 5792, section 4.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum IetfAttr {
    /// Request for a list of attribute types
    AttributeRequest = 1,
    /// Product vendor, id and name
    ProductInformation = 2,
    /// Numeric major/minor version
    NumericVersion = 3,
    /// Free-form version string
    StringVersion = 4,
    /// Operational status and last use
    OperationalStatus = 5,
    /// Port filter entries
    PortFilter = 6,
    /// Installed package inventory
    InstalledPackages = 7,
    /// PA-TNC error report
    PaTncError = 8,
    /// Assessment result
    AssessmentResult = 9,
    /// Remediation instructions
    RemediationInstructions = 10,
    /// IP forwarding status
    ForwardingEnabled = 11,
    /// Factory default password status
    FactoryDefaultPwdEnabled = 12,
}

impl IetfAttr {
    /// Convert from raw type number
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::AttributeRequest),
            2 => Some(Self::ProductInformation),
            3 => Some(Self::NumericVersion),
            4 => Some(Self::StringVersion),
            5 => Some(Self::OperationalStatus),
            6 => Some(Self::PortFilter),
            7 => Some(Self::InstalledPackages),
            8 => Some(Self::PaTncError),
            9 => Some(Self::AssessmentResult),
            10 => Some(Self::RemediationInstructions),
            11 => Some(Self::ForwardingEnabled),
            12 => Some(Self::FactoryDefaultPwdEnabled),
            _ => None,
        }
    }

    /// Human-readable attribute name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AttributeRequest => "Attribute Request",
            Self::ProductInformation => "Product Information",
            Self::NumericVersion => "Numeric Version",
            Self::StringVersion => "String Version",
            Self::OperationalStatus => "Operational Status",
            Self::PortFilter => "Port Filter",
            Self::InstalledPackages => "Installed Packages",
            Self::PaTncError => "PA-TNC Error",
            Self::AssessmentResult => "Assessment Result",
            Self::RemediationInstructions => "Remediation Instructions",
            Self::ForwardingEnabled => "Forwarding Enabled",
            Self::FactoryDefaultPwdEnabled => "Factory Default Password Enabled",
        }
    }
}

/// ITA vendor-specific attribute types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum ItaAttr {
    /// Command string
    Command = 1,
    /// Dummy padding attribute
    Dummy = 2,
    /// Request for named settings
    GetSettings = 3,
    /// Name/value settings bag
    Settings = 4,
    /// A helper process ("angel") started on the endpoint
    StartAngel = 5,
    /// A helper process ("angel") stopped on the endpoint
    StopAngel = 6,
    /// Opaque device identifier
    DeviceId = 7,
}

impl ItaAttr {
    /// Convert from raw type number
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Command),
            2 => Some(Self::Dummy),
            3 => Some(Self::GetSettings),
            4 => Some(Self::Settings),
            5 => Some(Self::StartAngel),
            6 => Some(Self::StopAngel),
            7 => Some(Self::DeviceId),
            _ => None,
        }
    }

    /// Human-readable attribute name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Command => "Command",
            Self::Dummy => "Dummy",
            Self::GetSettings => "Get Settings",
            Self::Settings => "Settings",
            Self::StartAngel => "Start Angel",
            Self::StopAngel => "Stop Angel",
            Self::DeviceId => "Device ID",
        }
    }
}

/// A known `(vendor, type)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    /// IETF standard attribute
    Ietf(IetfAttr),
    /// ITA vendor attribute
    Ita(ItaAttr),
}

/// Raw `(vendor id, type)` pair identifying an attribute on the wire.
///
/// Kept as raw integers so that attributes from newer peers round-trip
/// through the verifier untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeType {
    /// Private Enterprise Number of the defining vendor
    pub vendor_id: u32,
    /// Vendor-scoped type number
    pub ty: u32,
}

impl AttributeType {
    /// Build a type from raw numbers
    #[must_use]
    pub const fn new(vendor_id: u32, ty: u32) -> Self {
        Self { vendor_id, ty }
    }

    /// IETF standard attribute type
    #[must_use]
    pub const fn ietf(attr: IetfAttr) -> Self {
        Self::new(Pen::Ietf.to_u32(), attr as u32)
    }

    /// ITA vendor attribute type
    #[must_use]
    pub const fn ita(attr: ItaAttr) -> Self {
        Self::new(Pen::Ita.to_u32(), attr as u32)
    }

    /// Known vendor, if any
    #[must_use]
    pub const fn vendor(self) -> Option<Pen> {
        Pen::from_u32(self.vendor_id)
    }

    /// Resolve to a known attribute kind.
    ///
    /// Returns `None` for any pair outside the vocabulary, including known
    /// vendors with unassigned type numbers.
    #[must_use]
    pub const fn kind(self) -> Option<AttrKind> {
        match Pen::from_u32(self.vendor_id) {
            Some(Pen::Ietf) => match IetfAttr::from_u32(self.ty) {
                Some(attr) => Some(AttrKind::Ietf(attr)),
                None => None,
            },
            Some(Pen::Ita) => match ItaAttr::from_u32(self.ty) {
                Some(attr) => Some(AttrKind::Ita(attr)),
                None => None,
            },
            _ => None,
        }
    }
}

impl From<IetfAttr> for AttributeType {
    fn from(attr: IetfAttr) -> Self {
        Self::ietf(attr)
    }
}

impl From<ItaAttr> for AttributeType {
    fn from(attr: ItaAttr) -> Self {
        Self::ita(attr)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(AttrKind::Ietf(attr)) => write!(f, "IETF/{}", attr.name()),
            Some(AttrKind::Ita(attr)) => write!(f, "ITA/{}", attr.name()),
            None => write!(f, "{:#08x}/{}", self.vendor_id, self.ty),
        }
    }
}
