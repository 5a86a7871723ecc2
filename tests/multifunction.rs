//! Active-function detection and switching tests.
//!
//! Run with: `cargo test --test multifunction`

mod common;

use std::sync::Arc;
use std::time::Duration;

use albedo_snmp::{ActiveFunction, DeviceSession, Error, FunctionType, Oid, SwitchOutcome, Value};
use common::{FakeAgent, FakeConnector, MF_ACTIVE, MF_MODE, MF_TYPE, fixture_resolver, session};

fn active_oid() -> Oid {
    Oid::from_slice(&MF_ACTIVE).child(0)
}

fn mode_oid(row: u32) -> Oid {
    Oid::from_slice(&MF_MODE).child(row)
}

/// A device running `(active_class, modes[active_class])`, with one
/// function table row per class in `modes`.
fn device(active_class: i32, modes: &[(i32, i32)]) -> FakeAgent {
    let agent = FakeAgent::new().with(active_oid(), active_class);
    for (row, &(class, mode)) in (1u32..).zip(modes) {
        agent.insert(Oid::from_slice(&MF_TYPE).child(row), class);
        agent.insert(mode_oid(row), mode);
    }
    agent
}

/// Row 1 is TDM in endpoint mode, row 2 is PSN in Ethernet mode.
fn tdm_psn_device(active_class: i32) -> FakeAgent {
    device(active_class, &[(1, 1), (2, 1)])
}

// ============================================================================
// Detection
// ============================================================================

#[tokio::test]
async fn test_detects_function_from_class_and_row_mode() {
    let session = session(FakeConnector::new(tdm_psn_device(2)));

    let active = session.run(async |s| s.active_function().await).await.unwrap();

    assert_eq!(active, ActiveFunction::Function(FunctionType::PsnEthEndpoint));
}

#[tokio::test]
async fn test_unmapped_pair_is_unknown() {
    // Class 3 in mode 2 is not a known personality.
    let session = session(FakeConnector::new(device(3, &[(3, 2)])));

    let active = session.run(async |s| s.active_function().await).await.unwrap();

    assert_eq!(active, ActiveFunction::Unknown);
}

#[tokio::test]
async fn test_missing_row_for_active_class_is_unknown() {
    let session = session(FakeConnector::new(device(3, &[(1, 1), (2, 1)])));

    let active = session.run(async |s| s.active_function().await).await.unwrap();

    assert_eq!(active, ActiveFunction::Unknown);
}

#[tokio::test]
async fn test_not_multifunction_is_probed_once() {
    let agent = FakeAgent::new().with(Oid::from_slice(&[1, 3, 6, 1, 2, 1, 1, 5, 0]), "clock-only");
    let session = session(FakeConnector::new(agent.clone()));

    let (first, second, active) = session
        .run(async |s| {
            let first = s.is_multifunction().await?;
            let second = s.is_multifunction().await?;
            let active = s.active_function().await?;
            Ok((first, second, active))
        })
        .await
        .unwrap();

    assert!(!first && !second);
    assert_eq!(active, ActiveFunction::NotMultifunction);
    assert_eq!(agent.reads_of(&active_oid()), 1);
}

#[tokio::test]
async fn test_probe_timeout_means_not_multifunction() {
    let agent = tdm_psn_device(1);
    agent.time_out_get(active_oid());
    let session = session(FakeConnector::new(agent));

    let multifunction = session.run(async |s| s.is_multifunction().await).await.unwrap();

    assert!(!multifunction);
}

// ============================================================================
// Switching
// ============================================================================

#[tokio::test]
async fn test_ensure_active_function_writes_nothing() {
    let agent = tdm_psn_device(2);
    let session = session(FakeConnector::new(agent.clone()));

    let outcome = session
        .run(async |s| s.ensure_function(FunctionType::PsnEthEndpoint).await)
        .await
        .unwrap();

    assert_eq!(outcome, SwitchOutcome::AlreadyActive(FunctionType::PsnEthEndpoint));
    assert!(outcome.is_active());
    assert!(agent.writes().is_empty());
}

#[tokio::test]
async fn test_unavailable_class_writes_nothing() {
    let agent = tdm_psn_device(2);
    let session = session(FakeConnector::new(agent.clone()));

    let err = session
        .run(async |s| s.ensure_function(FunctionType::ClkmonActive).await)
        .await
        .unwrap_err();

    assert!(matches!(
        *err,
        Error::FunctionNotAvailable {
            function: FunctionType::ClkmonActive
        }
    ));
    assert!(agent.writes().is_empty());
}

#[tokio::test]
async fn test_switch_writes_mode_and_confirms() {
    let agent = tdm_psn_device(2);
    // The device applies a TDM mode write by switching to class 1.
    agent.on_set(mode_oid(1), 2, vec![(active_oid(), Value::Integer(1))]);
    let session = session(FakeConnector::new(agent.clone()));

    let outcome = session
        .run(async |s| s.ensure_function(FunctionType::TdmThrough).await)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SwitchOutcome::Switched {
            from: ActiveFunction::Function(FunctionType::PsnEthEndpoint),
            to: FunctionType::TdmThrough,
        }
    );
    assert_eq!(agent.writes(), vec![(mode_oid(1), Value::Integer(2))]);
}

#[tokio::test]
async fn test_switch_not_applied_fails_verification() {
    let agent = tdm_psn_device(2);
    let session = session(FakeConnector::new(agent.clone()));

    let err = session
        .run(async |s| s.switch_function(FunctionType::TdmMonitor).await)
        .await
        .unwrap_err();

    match *err {
        Error::SwitchVerificationFailed { wanted, observed } => {
            assert_eq!(wanted, FunctionType::TdmMonitor);
            assert_eq!(observed, ActiveFunction::Function(FunctionType::PsnEthEndpoint));
        }
        other => panic!("expected SwitchVerificationFailed, got {other:?}"),
    }
    assert_eq!(agent.writes(), vec![(mode_oid(1), Value::Integer(0))]);
}

#[tokio::test]
async fn test_switch_on_plain_device_writes_nothing() {
    let agent = FakeAgent::new();
    let session = session(FakeConnector::new(agent.clone()));

    let outcome = session
        .run(async |s| s.ensure_function(FunctionType::TdmEndpoint).await)
        .await
        .unwrap();

    assert_eq!(outcome, SwitchOutcome::NotMultifunction);
    assert!(!outcome.is_active());
    assert!(agent.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_switch_waits_for_settle_time() {
    let agent = tdm_psn_device(1);
    agent.on_set(mode_oid(2), 3, vec![(active_oid(), Value::Integer(2))]);
    let session = DeviceSession::builder("device-under-test")
        .connector(FakeConnector::new(agent.clone()))
        .resolver(Arc::new(fixture_resolver()))
        .settle_time(Duration::from_secs(3))
        .build();

    let start = tokio::time::Instant::now();
    let outcome = session
        .run(async |s| s.switch_function(FunctionType::PsnExternal).await)
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(3));
    assert_eq!(
        outcome,
        SwitchOutcome::Switched {
            from: ActiveFunction::Function(FunctionType::TdmEndpoint),
            to: FunctionType::PsnExternal,
        }
    );
}

// ============================================================================
// Device failures
// ============================================================================

#[tokio::test]
async fn test_active_class_read_failure_after_probe_is_an_error() {
    let agent = tdm_psn_device(2);
    let session = session(FakeConnector::new(agent.clone()));

    let err = session
        .run(async |s| {
            assert!(s.is_multifunction().await?);
            agent.time_out_get(active_oid());
            s.active_function().await
        })
        .await
        .unwrap_err();

    assert!(matches!(*err, Error::Timeout { .. }));
}

#[tokio::test]
async fn test_function_table_walk_failure_is_an_error() {
    let agent = tdm_psn_device(2);
    agent.fail_get_next_after(1);
    let session = session(FakeConnector::new(agent));

    let err = session.run(async |s| s.active_function().await).await.unwrap_err();

    assert!(matches!(*err, Error::Timeout { .. }));
}

#[tokio::test]
async fn test_truncated_function_table_does_not_hide_available_function() {
    // The clock monitor row is never reached before the walk fails.
    let agent = device(1, &[(1, 1), (2, 1), (3, 0)]);
    agent.fail_get_next_after(2);
    let session = session(FakeConnector::new(agent.clone()));

    let err = session
        .run(async |s| s.switch_function(FunctionType::ClkmonExternal).await)
        .await
        .unwrap_err();

    assert!(matches!(*err, Error::Timeout { .. }), "got {err:?}");
    assert!(agent.writes().is_empty());
}

#[tokio::test]
async fn test_ensure_with_failing_walk_writes_nothing() {
    let agent = tdm_psn_device(2);
    agent.fail_get_next_after(0);
    let session = session(FakeConnector::new(agent.clone()));

    let err = session
        .run(async |s| s.ensure_function(FunctionType::TdmEndpoint).await)
        .await
        .unwrap_err();

    assert!(matches!(*err, Error::Timeout { .. }));
    assert!(agent.writes().is_empty());
}

#[tokio::test]
async fn test_failed_redetection_after_switch_is_an_error() {
    let agent = tdm_psn_device(2);
    agent.on_set(mode_oid(1), 1, vec![(active_oid(), Value::Integer(1))]);
    // Four cells plus the end-of-view step: only the first table walk succeeds.
    agent.fail_get_next_after(5);
    let session = session(FakeConnector::new(agent.clone()));

    let err = session
        .run(async |s| s.switch_function(FunctionType::TdmEndpoint).await)
        .await
        .unwrap_err();

    assert!(matches!(*err, Error::Timeout { .. }));
    assert_eq!(agent.writes(), vec![(mode_oid(1), Value::Integer(1))]);
}
