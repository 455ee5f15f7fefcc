//! Property-based tests for the Verifier state machine.
//!
//! These tests use proptest to verify invariants hold for arbitrary event
//! sequences:
//! - At most one assessment is announced per connection
//! - Every provided recommendation repeats the first one
//! - The handshake phase never moves backwards
//! - The policy manager is started at most once per session
//! - No panics on arbitrary inputs

use posture_core::{
    Verifier, VerifierAction, VerifierConfig,
    policy::RecordingPolicy,
    session::HandshakePhase,
    storage::{MemoryStorage, PackageVersion},
};
use posture_proto::{
    Attribute, ConnectionState, FwdStatus, InboundMessage, OpResult, OpStatus, Package, Pen,
    Setting,
};
use proptest::prelude::*;

/// Host-side events that can hit a single connection
#[derive(Debug, Clone)]
enum Event {
    Message(Vec<Attribute>),
    FatalMessage,
    BatchEnding,
    Solicit,
    StateChange(ConnectionState),
}

fn attribute_strategy() -> impl Strategy<Value = Attribute> {
    prop_oneof![
        prop_oneof![Just("Debian"), Just("Android"), Just("Gentoo")]
            .prop_map(|name| Attribute::product_info(Pen::Ietf, 0, name)),
        prop_oneof![Just("7.0"), Just("4.2.2"), Just("")]
            .prop_map(|version| Attribute::string_version(version)),
        (any::<u32>(), any::<u32>())
            .prop_map(|(major, minor)| Attribute::numeric_version(major, minor)),
        any::<u64>().prop_map(|last_use| {
            Attribute::operational_status(OpStatus::Operational, OpResult::Successful, last_use)
        }),
        prop_oneof![Just(FwdStatus::Disabled), Just(FwdStatus::Enabled), Just(FwdStatus::Unknown)]
            .prop_map(Attribute::forwarding_enabled),
        any::<bool>().prop_map(Attribute::default_password_enabled),
        proptest::collection::vec(any::<u8>(), 0..8).prop_map(Attribute::device_id),
        prop_oneof![Just("0"), Just("1")].prop_map(|value| {
            Attribute::settings(vec![Setting::new("install_non_market_apps", value)])
        }),
        prop_oneof![Just("1.0"), Just("2.0")].prop_map(|version| {
            Attribute::installed_packages(vec![
                Package::new("openssl", version),
                Package::new("zsh", "5.0"),
            ])
        }),
        Just(Attribute::start_angel()),
        Just(Attribute::stop_angel()),
    ]
}

fn event_strategy() -> impl Strategy<Value = Event> {
    prop_oneof![
        4 => proptest::collection::vec(attribute_strategy(), 0..6).prop_map(Event::Message),
        1 => Just(Event::FatalMessage),
        4 => Just(Event::BatchEnding),
        1 => Just(Event::Solicit),
        1 => prop_oneof![
            Just(ConnectionState::Handshake),
            Just(ConnectionState::AccessAllowed),
            Just(ConnectionState::AccessIsolated),
            Just(ConnectionState::AccessNone),
        ]
        .prop_map(Event::StateChange),
    ]
}

fn verifier() -> Verifier<MemoryStorage, RecordingPolicy> {
    let storage = MemoryStorage::new();
    storage.add_package("Debian 7.0", "openssl", PackageVersion::release("1.0"));
    storage.add_package("Debian 7.0", "openssl", PackageVersion::security("2.0"));
    storage.add_product_database("Android 4.2.2");
    let mut verifier =
        Verifier::initialize(1, 1, 1, VerifierConfig::default(), storage, RecordingPolicy::new())
            .expect("version 1 is supported");
    verifier.notify_connection_change(1, ConnectionState::Create).expect("fresh connection");
    verifier
}

fn apply(
    verifier: &mut Verifier<MemoryStorage, RecordingPolicy>,
    event: &Event,
) -> Vec<VerifierAction> {
    let result = match event {
        Event::Message(attributes) => {
            verifier.receive_message(1, &InboundMessage::new(attributes.clone()))
        },
        Event::FatalMessage => verifier.receive_message(1, &InboundMessage::fatal()),
        Event::BatchEnding => verifier.batch_ending(1),
        Event::Solicit => verifier.solicit_recommendation(1),
        Event::StateChange(state) => {
            verifier.notify_connection_change(1, *state).map(|()| Vec::new())
        },
    };
    result.expect("connection stays known")
}

#[test]
fn prop_at_most_one_assessment() {
    proptest!(|(events in proptest::collection::vec(event_strategy(), 0..24))| {
        let mut verifier = verifier();
        let mut actions = Vec::new();
        for event in &events {
            actions.extend(apply(&mut verifier, event));
        }

        let assessments = actions
            .iter()
            .filter(|action| matches!(action, VerifierAction::SendAssessment { .. }))
            .count();
        prop_assert!(assessments <= 1);

        let verdicts: Vec<_> = actions.iter().filter_map(VerifierAction::verdict).collect();
        if let Some(first) = verdicts.first() {
            prop_assert!(verdicts.iter().all(|verdict| verdict == first));
            prop_assert_eq!(*first, verifier.session(1).unwrap().recommendation());
        }
    });
}

#[test]
fn prop_assessment_pairs_with_recommendation() {
    proptest!(|(events in proptest::collection::vec(event_strategy(), 0..24))| {
        let mut verifier = verifier();
        for event in &events {
            let actions = apply(&mut verifier, event);
            for (i, action) in actions.iter().enumerate() {
                if let VerifierAction::SendAssessment { recommendation, .. } = action {
                    let next = actions.get(i + 1).and_then(VerifierAction::verdict);
                    prop_assert_eq!(next, Some(*recommendation));
                }
            }
        }
    });
}

#[test]
fn prop_phase_never_goes_backward() {
    proptest!(|(events in proptest::collection::vec(event_strategy(), 0..24))| {
        let mut verifier = verifier();
        let mut phase = HandshakePhase::Init;
        for event in &events {
            apply(&mut verifier, event);
            let session = verifier.session(1).unwrap();
            prop_assert!(session.phase() >= phase);
            phase = session.phase();
        }
    });
}

#[test]
fn prop_policy_started_at_most_once() {
    proptest!(|(events in proptest::collection::vec(event_strategy(), 0..24))| {
        let mut verifier = verifier();
        for event in &events {
            apply(&mut verifier, event);
        }

        let session_id = verifier.session(1).unwrap().session_id();
        let starts = verifier.policy().starts(session_id);
        prop_assert!(starts <= 1);
        let started = verifier.session(1).unwrap().phase() == HandshakePhase::PolicyStarted;
        prop_assert_eq!(starts == 1, started);
    });
}

#[test]
fn prop_received_only_grows() {
    proptest!(|(events in proptest::collection::vec(event_strategy(), 0..24))| {
        let mut verifier = verifier();
        let mut received = verifier.session(1).unwrap().received();
        for event in &events {
            apply(&mut verifier, event);
            let now = verifier.session(1).unwrap().received();
            prop_assert!(now.contains(received));
            received = now;
        }
    });
}

#[test]
fn two_silent_rounds_end_in_error() {
    let mut verifier = verifier();

    let first = verifier.batch_ending(1).expect("known connection");
    assert_eq!(first.len(), 1);
    assert!(first[0].verdict().is_none());

    let second = verifier.batch_ending(1).expect("known connection");
    assert_eq!(
        second.iter().filter_map(VerifierAction::verdict).collect::<Vec<_>>(),
        vec![posture_proto::Recommendation::ERROR]
    );
}
