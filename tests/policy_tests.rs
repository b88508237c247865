//! Policy table integration tests: declarative loading and validation
//! independent of a running server, template matching, and specificity.

use std::io::Write;

use wardgate::policy::{self, Method};
use wardgate::roles::Role;

const PORTAL_POLICY_JSON: &str = r#"{
  "entries": [
    {"method": "GET",  "path": "/medical-records/enhanced", "capability": "ViewClinicalRecords"},
    {"method": "GET",  "path": "/medical-records/:id",      "capability": "ViewClinicalRecords"},
    {"method": "PUT",  "path": "/medical-records/:id",      "capability": "EditClinicalRecords"},
    {"method": "GET",  "path": "/lab/queue",                "capability": "ViewLabQueue"},
    {"method": "GET",  "path": "/billing/invoices",         "capability": "ViewInvoices"}
  ]
}"#;

#[test]
fn policy_loads_from_a_file_without_a_server() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(PORTAL_POLICY_JSON.as_bytes()).unwrap();

    let table = policy::from_file(&path).unwrap();
    assert_eq!(table.entries().len(), 5);
    assert!(table.lookup("/lab/queue", Method::Get).is_some());
}

#[test]
fn missing_policy_file_fails_loud() {
    let dir = tempfile::tempdir().unwrap();
    let err = policy::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.code_str(), "policy_file");
}

#[test]
fn literal_beats_parameter_for_the_same_concrete_path() {
    let table = policy::from_json_str(PORTAL_POLICY_JSON).unwrap();
    let hit = table.lookup("/medical-records/enhanced", Method::Get).unwrap();
    assert_eq!(hit.path(), "/medical-records/enhanced");
    let hit = table.lookup("/medical-records/1234", Method::Get).unwrap();
    assert_eq!(hit.path(), "/medical-records/:id");
}

#[test]
fn methods_are_distinct_keys() {
    let table = policy::from_json_str(PORTAL_POLICY_JSON).unwrap();
    let read = table.lookup("/medical-records/7", Method::Get).unwrap();
    let write = table.lookup("/medical-records/7", Method::Put).unwrap();
    assert_ne!(read.capability(), write.capability());
    assert!(table.lookup("/medical-records/7", Method::Delete).is_none());
}

#[test]
fn ambiguous_policy_file_is_rejected_at_load_time() {
    let json = r#"{
      "entries": [
        {"method": "GET", "path": "/records/:id/history", "capability": "ViewClinicalRecords"},
        {"method": "GET", "path": "/records/recent/:what", "capability": "ViewClinicalRecords"}
      ]
    }"#;
    let err = policy::from_json_str(json).unwrap_err();
    assert_eq!(err.code_str(), "ambiguous_policy");
}

#[test]
fn unknown_capability_is_rejected_at_parse_time() {
    let json = r#"{
      "entries": [
        {"method": "GET", "path": "/x", "capability": "DoAnything"}
      ]
    }"#;
    let err = policy::from_json_str(json).unwrap_err();
    assert_eq!(err.code_str(), "policy_parse");
}

#[test]
fn derived_role_sets_include_admin_everywhere_without_listing_it() {
    // The declarative document never names a role; Admin's wildcard
    // capability set still grants it every entry.
    assert!(!PORTAL_POLICY_JSON.contains("Admin"));
    let table = policy::from_json_str(PORTAL_POLICY_JSON).unwrap();
    for entry in table.entries() {
        assert!(entry.allowed_roles().contains(&Role::Admin), "{}", entry.path());
    }
}

#[test]
fn query_strings_and_trailing_slashes_do_not_affect_matching() {
    let table = policy::from_json_str(PORTAL_POLICY_JSON).unwrap();
    assert!(table.lookup("/lab/queue/", Method::Get).is_some());
    assert!(table.lookup("/lab/queue?page=2&sort=priority", Method::Get).is_some());
    assert!(table.lookup("/billing/invoices?status=open", Method::Get).is_some());
}
