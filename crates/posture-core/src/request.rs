//! Missing-attribute request builder.
//!
//! Given what a session has received, list the mandatory attribute types the
//! peer still owes. Output order is fixed so that outbound messages are
//! reproducible.
//!
//! Product Information and String Version are only ever requested together:
//! an OS identity is accepted only when both arrive in one message, so
//! re-requesting just the missing half would never complete it.

use posture_proto::{Attribute, AttributeType, IetfAttr, ItaAttr};

use crate::session::ReceivedAttributes;

/// Individually requested kinds, in wire order
const SINGLES: &[(ReceivedAttributes, AttributeType)] = &[
    (ReceivedAttributes::NUMERIC_VERSION, AttributeType::ietf(IetfAttr::NumericVersion)),
    (ReceivedAttributes::OPERATIONAL_STATUS, AttributeType::ietf(IetfAttr::OperationalStatus)),
    (ReceivedAttributes::FORWARDING_ENABLED, AttributeType::ietf(IetfAttr::ForwardingEnabled)),
    (
        ReceivedAttributes::DEFAULT_PASSWORD_ENABLED,
        AttributeType::ietf(IetfAttr::FactoryDefaultPwdEnabled),
    ),
    (ReceivedAttributes::DEVICE_ID, AttributeType::ita(ItaAttr::DeviceId)),
];

/// Attribute types still missing from `received`, in request order
#[must_use]
pub fn missing_attributes(received: ReceivedAttributes) -> Vec<AttributeType> {
    let mut missing = Vec::with_capacity(7);

    if !received.contains(ReceivedAttributes::IDENTITY) {
        missing.push(AttributeType::ietf(IetfAttr::ProductInformation));
        missing.push(AttributeType::ietf(IetfAttr::StringVersion));
    }

    missing.extend(
        SINGLES.iter().filter(|(kind, _)| !received.contains(*kind)).map(|&(_, ty)| ty),
    );

    missing
}

/// IETF Attribute Request for everything still missing
#[must_use]
pub fn build_attribute_request(received: ReceivedAttributes) -> Attribute {
    Attribute::attribute_request(missing_attributes(received))
}

/// IETF Attribute Request for the installed-packages inventory
#[must_use]
pub fn build_packages_request() -> Attribute {
    Attribute::attribute_request(vec![AttributeType::ietf(IetfAttr::InstalledPackages)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_received_requests_everything() {
        let missing = missing_attributes(ReceivedAttributes::empty());
        assert_eq!(missing, vec![
            AttributeType::ietf(IetfAttr::ProductInformation),
            AttributeType::ietf(IetfAttr::StringVersion),
            AttributeType::ietf(IetfAttr::NumericVersion),
            AttributeType::ietf(IetfAttr::OperationalStatus),
            AttributeType::ietf(IetfAttr::ForwardingEnabled),
            AttributeType::ietf(IetfAttr::FactoryDefaultPwdEnabled),
            AttributeType::ita(ItaAttr::DeviceId),
        ]);
    }

    #[test]
    fn everything_received_requests_nothing() {
        assert!(missing_attributes(ReceivedAttributes::all()).is_empty());
    }

    #[test]
    fn identity_halves_are_requested_as_pair() {
        for half in [ReceivedAttributes::PRODUCT_INFORMATION, ReceivedAttributes::STRING_VERSION] {
            let received = ReceivedAttributes::all().difference(half);
            assert_eq!(missing_attributes(received), vec![
                AttributeType::ietf(IetfAttr::ProductInformation),
                AttributeType::ietf(IetfAttr::StringVersion),
            ]);
        }
    }

    #[test]
    fn product_info_only_requests_pair_and_rest() {
        let missing = missing_attributes(ReceivedAttributes::PRODUCT_INFORMATION);
        assert_eq!(missing, vec![
            AttributeType::ietf(IetfAttr::ProductInformation),
            AttributeType::ietf(IetfAttr::StringVersion),
            AttributeType::ietf(IetfAttr::NumericVersion),
            AttributeType::ietf(IetfAttr::OperationalStatus),
            AttributeType::ietf(IetfAttr::ForwardingEnabled),
            AttributeType::ietf(IetfAttr::FactoryDefaultPwdEnabled),
            AttributeType::ita(ItaAttr::DeviceId),
        ]);
    }

    #[test]
    fn only_device_id_missing() {
        let received = ReceivedAttributes::all().difference(ReceivedAttributes::DEVICE_ID);
        assert_eq!(missing_attributes(received), vec![AttributeType::ita(ItaAttr::DeviceId)]);
    }

    #[test]
    fn packages_request_names_installed_packages() {
        let attr = build_packages_request();
        assert_eq!(attr.ty, AttributeType::ietf(IetfAttr::AttributeRequest));
        assert_eq!(
            attr.value,
            posture_proto::AttributeValue::Request(vec![AttributeType::ietf(
                IetfAttr::InstalledPackages
            )])
        );
    }
}
