//! Attribute classifier and message intake.
//!
//! [`classify`] maps one decoded attribute to a [`Fact`]. It is total: pairs
//! outside the vocabulary, and known pairs whose payload shape does not
//! match, become [`Fact::Unrecognized`] and are ignored.
//!
//! [`absorb`] applies the facts of one message to a session. Product
//! Information and String Version are buffered for the duration of the
//! message and only accepted as an OS identity when both are non-empty once
//! the whole message has been scanned.

use posture_proto::{
    AttrKind, Attribute, AttributeValue, FwdStatus, IetfAttr, ItaAttr, OpResult, OpStatus,
    OsInfo, Package, Pen, Setting,
};
use tracing::{debug, error, warn};

use crate::{
    config::VerifierConfig,
    session::{OsSettings, PostureSession, ReceivedAttributes},
    storage::Storage,
};

/// Semantic meaning of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fact<'a> {
    /// Operating-system product name
    ProductInfo {
        /// Vendor of the product
        vendor_id: u32,
        /// Product name
        name: &'a str,
    },
    /// Operating-system version string
    StringVersion(&'a str),
    /// Numeric version (diagnostics only)
    NumericVersion {
        /// Major version
        major: u32,
        /// Minor version
        minor: u32,
    },
    /// Operational status (diagnostics only)
    OperationalStatus {
        /// Status
        status: OpStatus,
        /// Result of last use
        result: OpResult,
        /// Last boot, seconds since the Unix epoch
        last_use: u64,
    },
    /// IP forwarding status
    Forwarding(FwdStatus),
    /// Factory default password status
    DefaultPassword(bool),
    /// Name/value settings
    Settings(&'a [Setting]),
    /// Installed package inventory
    InstalledPackages(&'a [Package]),
    /// Raw device identifier
    DeviceId(&'a [u8]),
    /// A helper process started
    AngelStarted,
    /// A helper process stopped
    AngelStopped,
    /// Anything else
    Unrecognized,
}

/// Classify one attribute
#[must_use]
pub fn classify(attr: &Attribute) -> Fact<'_> {
    let Some(kind) = attr.ty.kind() else {
        return Fact::Unrecognized;
    };

    match (kind, &attr.value) {
        (
            AttrKind::Ietf(IetfAttr::ProductInformation),
            AttributeValue::ProductInfo { vendor_id, name, .. },
        ) => Fact::ProductInfo { vendor_id: *vendor_id, name },
        (
            AttrKind::Ietf(IetfAttr::StringVersion),
            AttributeValue::StringVersion { version, .. },
        ) => Fact::StringVersion(version),
        (
            AttrKind::Ietf(IetfAttr::NumericVersion),
            AttributeValue::NumericVersion { major, minor },
        ) => Fact::NumericVersion { major: *major, minor: *minor },
        (
            AttrKind::Ietf(IetfAttr::OperationalStatus),
            AttributeValue::OperationalStatus { status, result, last_use },
        ) => Fact::OperationalStatus { status: *status, result: *result, last_use: *last_use },
        (AttrKind::Ietf(IetfAttr::ForwardingEnabled), AttributeValue::Forwarding(status)) => {
            Fact::Forwarding(*status)
        },
        (AttrKind::Ietf(IetfAttr::FactoryDefaultPwdEnabled), AttributeValue::Flag(enabled)) => {
            Fact::DefaultPassword(*enabled)
        },
        (AttrKind::Ietf(IetfAttr::InstalledPackages), AttributeValue::Packages(packages)) => {
            Fact::InstalledPackages(packages)
        },
        (AttrKind::Ita(ItaAttr::Settings), AttributeValue::Settings(settings)) => {
            Fact::Settings(settings)
        },
        (AttrKind::Ita(ItaAttr::DeviceId), AttributeValue::Opaque(value)) => Fact::DeviceId(value),
        (AttrKind::Ita(ItaAttr::StartAngel), _) => Fact::AngelStarted,
        (AttrKind::Ita(ItaAttr::StopAngel), _) => Fact::AngelStopped,
        _ => Fact::Unrecognized,
    }
}

/// Outcome of absorbing one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Intake {
    /// Package classification failed; the session must be concluded with an
    /// error verdict now
    pub hard_failure: bool,
}

/// Apply every attribute of one message to the session.
///
/// Storage writes that fail are logged and otherwise ignored, except for the
/// package check whose failure is reported through [`Intake::hard_failure`].
pub fn absorb(
    session: &mut PostureSession,
    attributes: &[Attribute],
    storage: &impl Storage,
    config: &VerifierConfig,
) -> Intake {
    let connection_id = session.connection_id();
    let mut intake = Intake::default();
    let mut os_name = "";
    let mut os_version = "";

    for attr in attributes {
        match classify(attr) {
            Fact::ProductInfo { vendor_id, name } => {
                session.set_received(ReceivedAttributes::PRODUCT_INFORMATION);
                os_name = name;
                match Pen::from_u32(vendor_id) {
                    Some(Pen::Ietf) => {
                        debug!(connection_id, os_name = name, "operating system name")
                    },
                    vendor => debug!(
                        connection_id,
                        os_name = name,
                        vendor = ?vendor,
                        vendor_id,
                        "operating system name from vendor"
                    ),
                }
            },
            Fact::StringVersion(version) => {
                session.set_received(ReceivedAttributes::STRING_VERSION);
                os_version = version;
                if !version.is_empty() {
                    debug!(connection_id, os_version = version, "operating system version");
                }
            },
            Fact::NumericVersion { major, minor } => {
                session.set_received(ReceivedAttributes::NUMERIC_VERSION);
                debug!(connection_id, major, minor, "operating system numeric version");
            },
            Fact::OperationalStatus { status, result, last_use } => {
                session.set_received(ReceivedAttributes::OPERATIONAL_STATUS);
                debug!(connection_id, ?status, ?result, last_boot = last_use, "operational status");
            },
            Fact::Forwarding(status) => {
                session.set_received(ReceivedAttributes::FORWARDING_ENABLED);
                debug!(connection_id, ?status, "IPv4 forwarding");
                if status == FwdStatus::Enabled {
                    session.set_settings(OsSettings::FWD_ENABLED);
                }
            },
            Fact::DefaultPassword(enabled) => {
                session.set_received(ReceivedAttributes::DEFAULT_PASSWORD_ENABLED);
                debug!(connection_id, enabled, "factory default password");
                if enabled {
                    session.set_settings(OsSettings::DEFAULT_PWD_ENABLED);
                }
            },
            Fact::Settings(settings) => {
                for setting in settings {
                    if setting.name == config.non_market_apps_key
                        && setting.value == config.non_market_apps_enabled.as_bytes()
                    {
                        session.set_settings(OsSettings::NON_MARKET_APPS);
                    }
                    debug!(
                        connection_id,
                        name = %setting.name,
                        value = %String::from_utf8_lossy(&setting.value),
                        "setting"
                    );
                }
            },
            Fact::InstalledPackages(packages) => {
                match storage.check_packages(session.session_id(), session.os_info(), packages) {
                    Ok(counts) => session.add_counts(&counts),
                    Err(e) => {
                        error!(
                            connection_id,
                            error = %e,
                            packages = packages.len(),
                            "package check failed"
                        );
                        intake.hard_failure = true;
                    },
                }
            },
            Fact::DeviceId(raw_id) => {
                session.set_received(ReceivedAttributes::DEVICE_ID);
                debug!(connection_id, device = %String::from_utf8_lossy(raw_id), "device ID");
                match storage.add_device(session.session_id(), raw_id) {
                    Ok(device_id) => session.set_device_id(device_id),
                    Err(e) => warn!(connection_id, error = %e, "failed to store device ID"),
                }
            },
            Fact::AngelStarted => session.angel_started(),
            Fact::AngelStopped => {
                if !session.angel_stopped() {
                    warn!(connection_id, "stop angel without running angel, ignored");
                }
            },
            Fact::Unrecognized => {},
        }
    }

    if !os_name.is_empty() && !os_version.is_empty() {
        let info = OsInfo::new(os_name, os_version);
        if let Err(e) = storage.add_product(session.session_id(), &info) {
            warn!(connection_id, error = %e, "failed to store product");
        }
        session.set_os_info(info);
    }

    intake
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use posture_proto::AttributeType;

    use super::*;
    use crate::storage::{MemoryStorage, PackageVersion};

    fn setup() -> (PostureSession, MemoryStorage) {
        let storage = MemoryStorage::new();
        let session_id = storage.add_session(1).unwrap();
        (PostureSession::new(1, session_id), storage)
    }

    #[test]
    fn unknown_pairs_are_unrecognized() {
        let attr = Attribute::new(AttributeType::new(0x1234, 1), AttributeValue::Empty);
        assert_eq!(classify(&attr), Fact::Unrecognized);

        // Known type with the wrong payload shape
        let attr = Attribute::new(
            AttributeType::ietf(IetfAttr::StringVersion),
            AttributeValue::Flag(true),
        );
        assert_eq!(classify(&attr), Fact::Unrecognized);

        // Attribute requests coming from the peer carry no posture
        assert_eq!(classify(&Attribute::attribute_request(vec![])), Fact::Unrecognized);
    }

    #[test]
    fn classify_extracts_payload() {
        assert_eq!(classify(&Attribute::string_version("7.0")), Fact::StringVersion("7.0"));
        assert_eq!(
            classify(&Attribute::device_id(Bytes::from_static(b"a1b2"))),
            Fact::DeviceId(b"a1b2")
        );
        assert_eq!(classify(&Attribute::start_angel()), Fact::AngelStarted);
    }

    #[test]
    fn identity_needs_both_halves_in_one_message() {
        let (mut session, storage) = setup();
        let config = VerifierConfig::default();

        absorb(&mut session, &[Attribute::product_info(Pen::Ietf, 0, "Debian")], &storage, &config);
        assert!(session.os_info().is_none());

        absorb(&mut session, &[Attribute::string_version("7.0")], &storage, &config);
        assert!(session.os_info().is_none());
        assert!(session.received().contains(ReceivedAttributes::IDENTITY));

        absorb(
            &mut session,
            &[Attribute::string_version("7.0"), Attribute::product_info(Pen::Ietf, 0, "Debian")],
            &storage,
            &config,
        );
        assert_eq!(session.os_info(), Some(&OsInfo::new("Debian", "7.0")));
        assert_eq!(
            storage.session(session.session_id()).unwrap().product,
            Some(OsInfo::new("Debian", "7.0"))
        );
    }

    #[test]
    fn empty_identity_is_not_accepted() {
        let (mut session, storage) = setup();
        absorb(
            &mut session,
            &[Attribute::product_info(Pen::Ietf, 0, "Debian"), Attribute::string_version("")],
            &storage,
            &VerifierConfig::default(),
        );
        assert!(session.os_info().is_none());
        assert!(session.received().contains(ReceivedAttributes::IDENTITY));
    }

    #[test]
    fn risky_settings_are_flagged() {
        let (mut session, storage) = setup();
        absorb(
            &mut session,
            &[
                Attribute::forwarding_enabled(FwdStatus::Enabled),
                Attribute::default_password_enabled(false),
                Attribute::settings(vec![
                    Setting::new("install_non_market_apps", &b"1"[..]),
                    Setting::new("unrelated", &b"1"[..]),
                ]),
            ],
            &storage,
            &VerifierConfig::default(),
        );
        assert_eq!(session.settings(), OsSettings::FWD_ENABLED | OsSettings::NON_MARKET_APPS);
        assert!(session.received().contains(
            ReceivedAttributes::FORWARDING_ENABLED | ReceivedAttributes::DEFAULT_PASSWORD_ENABLED
        ));
    }

    #[test]
    fn non_market_apps_needs_exact_value() {
        let (mut session, storage) = setup();
        absorb(
            &mut session,
            &[Attribute::settings(vec![Setting::new("install_non_market_apps", &b"0"[..])])],
            &storage,
            &VerifierConfig::default(),
        );
        assert!(session.settings().is_empty());
    }

    #[test]
    fn forwarding_disabled_or_unknown_is_not_risky() {
        let (mut session, storage) = setup();
        absorb(
            &mut session,
            &[
                Attribute::forwarding_enabled(FwdStatus::Disabled),
                Attribute::forwarding_enabled(FwdStatus::Unknown),
            ],
            &storage,
            &VerifierConfig::default(),
        );
        assert!(session.settings().is_empty());
    }

    #[test]
    fn device_id_is_stored() {
        let (mut session, storage) = setup();
        let config = VerifierConfig::default();
        absorb(&mut session, &[Attribute::device_id(&b"dev-1"[..])], &storage, &config);
        assert!(session.received().contains(ReceivedAttributes::DEVICE_ID));
        assert_eq!(session.device_id(), Some(1));
    }

    #[test]
    fn packages_accumulate_and_failures_escalate() {
        let (mut session, storage) = setup();
        storage.add_package("Debian 7.0", "bash", PackageVersion::security("4.2"));
        let config = VerifierConfig::default();

        // No identity yet: hard failure
        let intake = absorb(
            &mut session,
            &[Attribute::installed_packages(vec![Package::new("bash", "4.2")])],
            &storage,
            &config,
        );
        assert!(intake.hard_failure);

        absorb(
            &mut session,
            &[Attribute::product_info(Pen::Ietf, 0, "Debian"), Attribute::string_version("7.0")],
            &storage,
            &config,
        );
        for _ in 0..2 {
            let intake = absorb(
                &mut session,
                &[Attribute::installed_packages(vec![
                    Package::new("bash", "4.2"),
                    Package::new("bash", "4.1"),
                ])],
                &storage,
                &config,
            );
            assert!(!intake.hard_failure);
        }
        assert_eq!(session.counts().total, 4);
        assert_eq!(session.counts().ok, 2);
        assert_eq!(session.counts().update, 2);
    }

    #[test]
    fn angel_markers_adjust_count() {
        let (mut session, storage) = setup();
        let config = VerifierConfig::default();
        absorb(&mut session, &[Attribute::stop_angel()], &storage, &config);
        assert_eq!(session.angel_count(), 0);
        let starts = [Attribute::start_angel(), Attribute::start_angel()];
        absorb(&mut session, &starts, &storage, &config);
        absorb(&mut session, &[Attribute::stop_angel()], &storage, &config);
        assert_eq!(session.angel_count(), 1);
    }
}
