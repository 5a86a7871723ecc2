//! Symbolic addressing tests.
//!
//! Run with: `cargo test --test resolver`

mod common;

use albedo_snmp::mib::SNMPV2_MIB;
use albedo_snmp::{Error, Location, Oid, ResolutionErrorKind, Resolver, oid};
use common::{MF_ACTIVE, MF_MODE, fixture_resolver};
use std::path::PathBuf;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mibs")
}

fn resolution_kind(err: &Error) -> ResolutionErrorKind {
    match err {
        Error::Resolution { reason, .. } => *reason,
        other => panic!("expected a resolution error, got {other:?}"),
    }
}

// ============================================================================
// Forward resolution
// ============================================================================

#[test]
fn test_resolve_scalar_instance() {
    let resolver = fixture_resolver();
    let oid = resolver
        .resolve("ATSL-MULTIFUNCTION-MIB", "mfActiveFunc", &[0])
        .unwrap();
    assert_eq!(oid, Oid::from_slice(&MF_ACTIVE).child(0));
}

#[test]
fn test_resolve_column_with_multi_arc_index() {
    let resolver = fixture_resolver();
    let oid = resolver
        .resolve("ATSL-MULTIFUNCTION-MIB", "mfFuncMode", &[3, 7])
        .unwrap();
    assert_eq!(oid, Oid::from_slice(&MF_MODE).join(&[3, 7]));
}

#[test]
fn test_resolve_without_indices_is_the_symbol_address() {
    let resolver = fixture_resolver();
    let oid = resolver.resolve(SNMPV2_MIB, "sysDescr", &[]).unwrap();
    assert_eq!(oid, oid!(1, 3, 6, 1, 2, 1, 1, 1));
}

#[test]
fn test_numeric_symbol_passes_through() {
    let resolver = fixture_resolver();
    let oid = resolver.resolve("ANY-MODULE", "1.3.6.1.2.1.1.5", &[0]).unwrap();
    assert_eq!(oid, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0));
    assert!(resolver.loaded_modules().is_empty());
}

#[test]
fn test_resolution_failure_kinds() {
    let resolver = fixture_resolver();

    let err = resolver.resolve("NO-SUCH-MIB", "anything", &[0]).unwrap_err();
    assert_eq!(resolution_kind(&err), ResolutionErrorKind::ModuleNotFound);

    let err = resolver
        .resolve("ATSL-MULTIFUNCTION-MIB", "mfNoSuchThing", &[0])
        .unwrap_err();
    assert_eq!(resolution_kind(&err), ResolutionErrorKind::SymbolNotFound);

    let err = resolver.resolve("ALBEDO-DEMO-MIB", "DemoMode", &[]).unwrap_err();
    assert_eq!(resolution_kind(&err), ResolutionErrorKind::SymbolHasNoAddress);

    let err = resolver.resolve("", "sysDescr", &[0]).unwrap_err();
    assert_eq!(resolution_kind(&err), ResolutionErrorKind::ModuleNotFound);
}

#[test]
fn test_resolution_error_names_module_and_symbol() {
    let resolver = fixture_resolver();
    let err = resolver
        .resolve("ATSL-MULTIFUNCTION-MIB", "mfNoSuchThing", &[0])
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("ATSL-MULTIFUNCTION-MIB::mfNoSuchThing"), "{message}");
    assert!(message.contains("symbol not found"), "{message}");
}

#[test]
fn test_resolve_name_forms() {
    let resolver = fixture_resolver();
    assert_eq!(
        resolver.resolve_name("SNMPv2-MIB::sysName.0").unwrap(),
        oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
    );
    assert_eq!(
        resolver.resolve_name("ATSL-MULTIFUNCTION-MIB::mfFuncTable").unwrap(),
        oid!(1, 3, 6, 1, 4, 1, 39412, 1, 12, 1, 2)
    );
    assert_eq!(
        resolver.resolve_name("1.3.6.1.2.1.1.3.0").unwrap(),
        oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
    );
    assert!(matches!(
        *resolver.resolve_name("SNMPv2-MIB::sysName.x").unwrap_err(),
        Error::InvalidOid(_)
    ));
}

// ============================================================================
// Reverse resolution
// ============================================================================

#[test]
fn test_reverse_round_trip() {
    let resolver = fixture_resolver();
    let oid = resolver
        .resolve("ATSL-MULTIFUNCTION-MIB", "mfFuncMode", &[2])
        .unwrap();

    let location = resolver.reverse(&oid);
    assert_eq!(
        location,
        Location::Symbolic {
            module: "ATSL-MULTIFUNCTION-MIB".into(),
            name: "mfFuncMode".into(),
            suffix: vec![2],
        }
    );
    assert_eq!(location.to_string(), "ATSL-MULTIFUNCTION-MIB::mfFuncMode.2");
    assert_eq!(resolver.resolve_name(&location.to_string()).unwrap(), oid);
}

#[test]
fn test_reverse_prefers_longest_match() {
    let resolver = fixture_resolver();
    resolver.module("ATSL-CONFIG-FILES-MIB").unwrap();

    let oid = common::config_files_column("Status", 4);
    let location = resolver.reverse(&oid);
    assert_eq!(location.to_string(), "ATSL-CONFIG-FILES-MIB::configFilesOpsStatus.4");
}

#[test]
fn test_reverse_unknown_address_is_numeric() {
    let resolver = fixture_resolver();
    resolver.module(SNMPV2_MIB).unwrap();

    let oid = oid!(1, 3, 6, 1, 4, 1, 99999, 1, 0);
    let location = resolver.reverse(&oid);
    assert!(!location.is_symbolic());
    assert_eq!(location, Location::Numeric(oid.clone()));
    assert_eq!(location.to_string(), oid.to_string());
}

#[test]
fn test_reverse_only_searches_loaded_modules() {
    let resolver = fixture_resolver();
    let oid = Oid::from_slice(&MF_ACTIVE).child(0);
    assert!(!resolver.reverse(&oid).is_symbolic());

    resolver.module("ATSL-MULTIFUNCTION-MIB").unwrap();
    assert_eq!(
        resolver.reverse(&oid).to_string(),
        "ATSL-MULTIFUNCTION-MIB::mfActiveFunc.0"
    );
}

// ============================================================================
// JSON schema directory
// ============================================================================

#[test]
fn test_from_dir_loads_json_modules() {
    let resolver = Resolver::from_dir(fixture_dir());
    let oid = resolver
        .resolve("ATSL-TDM-MONITOR-MIB", "tdmMonPortAlarm", &[1, 4])
        .unwrap();
    assert_eq!(oid, oid!(1, 3, 6, 1, 4, 1, 39412, 1, 20, 2, 1, 3, 1, 4));
    assert_eq!(
        resolver.reverse(&oid).to_string(),
        "ATSL-TDM-MONITOR-MIB::tdmMonPortAlarm.1.4"
    );
}

#[test]
fn test_from_dir_falls_back_to_builtin() {
    let resolver = Resolver::from_dir(fixture_dir());
    assert_eq!(
        resolver.resolve(SNMPV2_MIB, "sysUpTime", &[0]).unwrap(),
        oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
    );
}

#[test]
fn test_unparseable_module_is_not_found_and_not_cached() {
    let resolver = Resolver::from_dir(fixture_dir());
    let err = resolver.resolve("BROKEN-MIB", "brokenScalar", &[0]).unwrap_err();
    assert_eq!(resolution_kind(&err), ResolutionErrorKind::ModuleNotFound);
    assert!(!resolver.loaded_modules().contains(&"BROKEN-MIB".to_string()));
}

#[test]
fn test_diagnostics_report_loaded_modules() {
    let resolver = Resolver::from_dir(fixture_dir());
    resolver.module("ATSL-TDM-MONITOR-MIB").unwrap();

    let diagnostics = resolver.diagnose();
    assert_eq!(diagnostics.loaded, vec![("ATSL-TDM-MONITOR-MIB".to_string(), 7)]);
    let text = diagnostics.to_string();
    assert!(text.contains("ATSL-TDM-MONITOR-MIB (7 symbols)"), "{text}");
}
