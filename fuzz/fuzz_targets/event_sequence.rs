//! Event sequence fuzzer for the posture verifier
//!
//! Every input byte selects one host event for a single connection:
//! - A message built from a fixed table of attributes
//! - A fatal message
//! - A batch boundary
//! - A solicited recommendation
//! - A connection state change
//!
//! Whatever the order, the verifier must keep its invariants.

#![no_main]

use libfuzzer_sys::fuzz_target;
use posture_core::{
    Verifier, VerifierAction, VerifierConfig,
    policy::RecordingPolicy,
    storage::{MemoryStorage, PackageVersion},
};
use posture_proto::{
    Attribute, ConnectionState, FwdStatus, InboundMessage, OpResult, OpStatus, Package, Pen,
    Setting,
};

// Attributes a message can carry, selected by the low bits of a byte
fn attribute(selector: u8) -> Attribute {
    match selector % 14 {
        0 => Attribute::product_info(Pen::Ietf, 0, "Debian"),
        1 => Attribute::product_info(Pen::Ita, 1, "Android"),
        2 => Attribute::string_version("7.0"),
        3 => Attribute::string_version(""),
        4 => Attribute::numeric_version(7, 0),
        5 => Attribute::operational_status(OpStatus::Operational, OpResult::Successful, 0),
        6 => Attribute::forwarding_enabled(FwdStatus::Enabled),
        7 => Attribute::default_password_enabled(true),
        8 => Attribute::device_id(vec![selector]),
        9 => Attribute::settings(vec![Setting::new("install_non_market_apps", "1")]),
        10 => Attribute::installed_packages(vec![Package::new("openssl", "1.0")]),
        11 => Attribute::installed_packages(vec![Package::new("openssl", "2.0")]),
        12 => Attribute::start_angel(),
        _ => Attribute::stop_angel(),
    }
}

const STATES: &[ConnectionState] = &[
    ConnectionState::Handshake,
    ConnectionState::AccessAllowed,
    ConnectionState::AccessIsolated,
    ConnectionState::AccessNone,
];

fuzz_target!(|data: &[u8]| {
    let storage = MemoryStorage::new();
    storage.add_package("Debian 7.0", "openssl", PackageVersion::release("1.0"));
    storage.add_package("Debian 7.0", "openssl", PackageVersion::security("2.0"));

    let Ok(mut verifier) =
        Verifier::initialize(1, 1, 1, VerifierConfig::default(), storage, RecordingPolicy::new())
    else {
        return;
    };
    if verifier.notify_connection_change(1, ConnectionState::Create).is_err() {
        return;
    }

    let mut actions = Vec::new();
    let mut bytes = data.iter().copied();

    while let Some(op) = bytes.next() {
        let result = match op % 8 {
            0..=2 => {
                let count = usize::from(op >> 5);
                let attributes = bytes.by_ref().take(count).map(attribute).collect();
                verifier.receive_message(1, &InboundMessage::new(attributes))
            },
            3 => verifier.receive_message(1, &InboundMessage::fatal()),
            4 | 5 => verifier.batch_ending(1),
            6 => verifier.solicit_recommendation(1),
            _ => {
                let state = STATES[usize::from(op >> 3) % STATES.len()];
                verifier.notify_connection_change(1, state).map(|()| Vec::new())
            },
        };

        // INVARIANT 1: The connection stays known
        let step = result.expect("connection must stay known");

        // INVARIANT 2: Assessment and recommendation come as an adjacent pair
        for (i, action) in step.iter().enumerate() {
            if let VerifierAction::SendAssessment { recommendation, .. } = action {
                let next = step.get(i + 1).and_then(VerifierAction::verdict);
                assert_eq!(next, Some(*recommendation));
            }
        }
        actions.extend(step);
    }

    // INVARIANT 3: At most one assessment, and every provided verdict agrees
    let assessments =
        actions.iter().filter(|a| matches!(a, VerifierAction::SendAssessment { .. })).count();
    assert!(assessments <= 1, "assessment announced {assessments} times");

    let verdicts: Vec<_> = actions.iter().filter_map(VerifierAction::verdict).collect();
    if let Some(first) = verdicts.first() {
        assert!(verdicts.iter().all(|v| v == first), "conflicting verdicts {verdicts:?}");
    }

    // INVARIANT 4: Policy started at most once
    let session_id = verifier.session(1).map(|s| s.session_id()).unwrap_or_default();
    assert!(verifier.policy().starts(session_id) <= 1);

    verifier.terminate();
});
