//! Decoded posture attributes.
//!
//! An [`Attribute`] pairs the raw [`AttributeType`] with the payload shape
//! the host decoder produced for it. The verifier decides what a pair means;
//! a pair whose payload shape does not match its type is treated like an
//! unknown attribute and ignored.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::{
    errors::{ProtocolError, Result},
    pen::{AttributeType, IetfAttr, ItaAttr, Pen},
};

/// Operational status of the product (RFC 5792, section 4.2.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OpStatus {
    /// Status unknown
    Unknown = 0,
    /// Product not installed
    NotInstalled = 1,
    /// Installed but not running
    InstalledNotOperational = 2,
    /// Running
    Operational = 3,
}

impl TryFrom<u8> for OpStatus {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::NotInstalled),
            2 => Ok(Self::InstalledNotOperational),
            3 => Ok(Self::Operational),
            _ => {
                Err(ProtocolError::UnknownCode { kind: "operational status", value: value.into() })
            },
        }
    }
}

/// Result of the product's last use (RFC 5792, section 4.2.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OpResult {
    /// Result unknown
    Unknown = 0,
    /// Last use succeeded
    Successful = 1,
    /// Last use ended with errors
    Errored = 2,
    /// Last use failed
    Unsuccessful = 3,
}

impl TryFrom<u8> for OpResult {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Successful),
            2 => Ok(Self::Errored),
            3 => Ok(Self::Unsuccessful),
            _ => {
                Err(ProtocolError::UnknownCode { kind: "operational result", value: value.into() })
            },
        }
    }
}

/// IP forwarding status (RFC 5792, section 4.2.11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum FwdStatus {
    /// Forwarding disabled
    Disabled = 0,
    /// Forwarding enabled
    Enabled = 1,
    /// Status could not be determined
    Unknown = 2,
}

impl TryFrom<u32> for FwdStatus {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Enabled),
            2 => Ok(Self::Unknown),
            _ => Err(ProtocolError::UnknownCode { kind: "forwarding status", value }),
        }
    }
}

/// One entry of an installed-packages inventory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    /// Package name
    pub name: String,
    /// Installed version
    pub version: String,
}

impl Package {
    /// Create a package descriptor
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into() }
    }
}

/// One name/value pair of a settings bag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    /// Setting name
    pub name: String,
    /// Raw setting value
    pub value: Bytes,
}

impl Setting {
    /// Create a setting
    pub fn new(name: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Decoded payload shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// No payload (angel markers)
    Empty,
    /// Product information
    ProductInfo {
        /// Vendor of the product
        vendor_id: u32,
        /// Vendor-scoped product id
        product_id: u16,
        /// Product name
        name: String,
    },
    /// Version string (with optional build and configuration strings)
    StringVersion {
        /// Product version
        version: String,
        /// Build number
        build: String,
        /// Configuration
        config: String,
    },
    /// Numeric version
    NumericVersion {
        /// Major version
        major: u32,
        /// Minor version
        minor: u32,
    },
    /// Operational status
    OperationalStatus {
        /// Status
        status: OpStatus,
        /// Result of last use
        result: OpResult,
        /// Last use, seconds since the Unix epoch
        last_use: u64,
    },
    /// Forwarding status
    Forwarding(FwdStatus),
    /// Boolean status
    Flag(bool),
    /// Installed packages inventory
    Packages(Vec<Package>),
    /// Settings bag
    Settings(Vec<Setting>),
    /// List of requested attribute types
    Request(Vec<AttributeType>),
    /// Opaque bytes (device id, unknown attributes)
    Opaque(Bytes),
}

/// A decoded posture attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Wire type
    pub ty: AttributeType,
    /// Decoded payload
    pub value: AttributeValue,
}

impl Attribute {
    /// Pair a type with a payload
    #[must_use]
    pub fn new(ty: AttributeType, value: AttributeValue) -> Self {
        Self { ty, value }
    }

    /// IETF Product Information
    pub fn product_info(vendor: Pen, product_id: u16, name: impl Into<String>) -> Self {
        Self::new(
            AttributeType::ietf(IetfAttr::ProductInformation),
            AttributeValue::ProductInfo {
                vendor_id: vendor.to_u32(),
                product_id,
                name: name.into(),
            },
        )
    }

    /// IETF String Version with empty build and configuration
    pub fn string_version(version: impl Into<String>) -> Self {
        Self::new(
            AttributeType::ietf(IetfAttr::StringVersion),
            AttributeValue::StringVersion {
                version: version.into(),
                build: String::new(),
                config: String::new(),
            },
        )
    }

    /// IETF Numeric Version
    #[must_use]
    pub fn numeric_version(major: u32, minor: u32) -> Self {
        Self::new(
            AttributeType::ietf(IetfAttr::NumericVersion),
            AttributeValue::NumericVersion { major, minor },
        )
    }

    /// IETF Operational Status
    #[must_use]
    pub fn operational_status(status: OpStatus, result: OpResult, last_use: u64) -> Self {
        Self::new(
            AttributeType::ietf(IetfAttr::OperationalStatus),
            AttributeValue::OperationalStatus { status, result, last_use },
        )
    }

    /// IETF Forwarding Enabled
    #[must_use]
    pub fn forwarding_enabled(status: FwdStatus) -> Self {
        Self::new(
            AttributeType::ietf(IetfAttr::ForwardingEnabled),
            AttributeValue::Forwarding(status),
        )
    }

    /// IETF Factory Default Password Enabled
    #[must_use]
    pub fn default_password_enabled(enabled: bool) -> Self {
        Self::new(
            AttributeType::ietf(IetfAttr::FactoryDefaultPwdEnabled),
            AttributeValue::Flag(enabled),
        )
    }

    /// IETF Installed Packages
    #[must_use]
    pub fn installed_packages(packages: Vec<Package>) -> Self {
        Self::new(
            AttributeType::ietf(IetfAttr::InstalledPackages),
            AttributeValue::Packages(packages),
        )
    }

    /// IETF Attribute Request
    #[must_use]
    pub fn attribute_request(types: Vec<AttributeType>) -> Self {
        Self::new(AttributeType::ietf(IetfAttr::AttributeRequest), AttributeValue::Request(types))
    }

    /// ITA Settings
    #[must_use]
    pub fn settings(settings: Vec<Setting>) -> Self {
        Self::new(AttributeType::ita(ItaAttr::Settings), AttributeValue::Settings(settings))
    }

    /// ITA Device ID
    pub fn device_id(value: impl Into<Bytes>) -> Self {
        Self::new(AttributeType::ita(ItaAttr::DeviceId), AttributeValue::Opaque(value.into()))
    }

    /// ITA Start Angel
    #[must_use]
    pub fn start_angel() -> Self {
        Self::new(AttributeType::ita(ItaAttr::StartAngel), AttributeValue::Empty)
    }

    /// ITA Stop Angel
    #[must_use]
    pub fn stop_angel() -> Self {
        Self::new(AttributeType::ita(ItaAttr::StopAngel), AttributeValue::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_reject_out_of_range() {
        assert_eq!(OpStatus::try_from(3), Ok(OpStatus::Operational));
        assert!(OpStatus::try_from(4).is_err());
        assert_eq!(OpResult::try_from(2), Ok(OpResult::Errored));
        assert_eq!(FwdStatus::try_from(1), Ok(FwdStatus::Enabled));
        assert_eq!(
            FwdStatus::try_from(7),
            Err(ProtocolError::UnknownCode { kind: "forwarding status", value: 7 })
        );
    }

    #[test]
    fn constructors_use_matching_types() {
        assert_eq!(Attribute::device_id(&b"abc"[..]).ty, AttributeType::ita(ItaAttr::DeviceId));
        assert_eq!(Attribute::stop_angel().value, AttributeValue::Empty);
        assert_eq!(
            Attribute::installed_packages(vec![]).ty,
            AttributeType::ietf(IetfAttr::InstalledPackages)
        );
    }
}
