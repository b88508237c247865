//! Guard integration tests: the role/policy matrix and the literal portal
//! scenarios, exercised against the built-in policy table. The matrix test is
//! generated from the table's own entries so the suite cannot drift from the
//! policy it claims to verify.

use std::sync::Arc;

use chrono::{Duration, Utc};
use wardgate::guard::{Decision, DenyReason, Guard};
use wardgate::identity::Identity;
use wardgate::policy::{default_portal_policy, Method};
use wardgate::roles::{Role, ALL_ROLES};

fn identity(role: Role) -> Identity {
    let now = Utc::now();
    Identity {
        subject: format!("{role}-subject"),
        role,
        issued_at: now,
        expires_at: now + Duration::hours(1),
    }
}

fn guard() -> Guard {
    Guard::new(Arc::new(default_portal_policy()))
}

#[test]
fn full_role_matrix_generated_from_the_table() {
    let g = guard();
    for entry in g.table().entries() {
        let allowed = entry.allowed_roles();
        assert!(!allowed.is_empty(), "{} {} allows nobody", entry.method(), entry.path());
        // Concrete path: substitute a literal for each parameter segment.
        let concrete = entry.path().replace(":id", "42");
        for role in ALL_ROLES {
            let id = identity(*role);
            let decision = g.authorize(Some(&id), &concrete, entry.method());
            if allowed.contains(role) {
                assert_eq!(
                    decision,
                    Decision::Allow,
                    "{role} should reach {} {}",
                    entry.method(),
                    entry.path()
                );
            } else {
                assert_eq!(
                    decision,
                    Decision::Deny(DenyReason::RoleNotPermitted),
                    "{role} should be denied on {} {}",
                    entry.method(),
                    entry.path()
                );
            }
        }
    }
}

#[test]
fn anonymous_is_always_unauthenticated_regardless_of_route_rules() {
    let g = guard();
    for entry in g.table().entries() {
        let concrete = entry.path().replace(":id", "42");
        assert_eq!(
            g.authorize(None, &concrete, entry.method()),
            Decision::Deny(DenyReason::Unauthenticated),
            "{} {}",
            entry.method(),
            entry.path()
        );
    }
}

#[test]
fn no_implicit_allow_for_unconfigured_routes() {
    let g = guard();
    for role in ALL_ROLES {
        let id = identity(*role);
        for (path, method) in [
            ("/no-such-route", Method::Get),
            ("/medical-records/enhanced/extra", Method::Get),
            ("/lab", Method::Get),
            ("/lab/queue", Method::Delete),
        ] {
            let decision = g.authorize(Some(&id), path, method);
            assert_eq!(
                decision,
                Decision::Deny(DenyReason::NoPolicy),
                "{role} on {method} {path}"
            );
        }
    }
}

#[test]
fn scenario_patient_denied_enhanced_records() {
    let g = guard();
    let patient = identity(Role::Patient);
    let d = g.authorize(Some(&patient), "/medical-records/enhanced", Method::Get);
    assert_eq!(d, Decision::Deny(DenyReason::RoleNotPermitted));
    let Decision::Deny(reason) = d else { unreachable!() };
    assert_eq!(reason.http_status(), 403);
}

#[test]
fn scenario_doctor_allowed_enhanced_records() {
    let g = guard();
    let doctor = identity(Role::Doctor);
    assert_eq!(
        g.authorize(Some(&doctor), "/medical-records/enhanced", Method::Get),
        Decision::Allow
    );
}

#[test]
fn scenario_anonymous_lab_queue_is_401() {
    let g = guard();
    let d = g.authorize(None, "/lab/queue", Method::Get);
    let Decision::Deny(reason) = d else { panic!("expected deny") };
    assert_eq!(reason, DenyReason::Unauthenticated);
    assert_eq!(reason.http_status(), 401);
}

#[test]
fn scenario_lab_technician_allowed_lab_queue() {
    let g = guard();
    let tech = identity(Role::LabTechnician);
    assert_eq!(g.authorize(Some(&tech), "/lab/queue", Method::Get), Decision::Allow);
}

#[test]
fn scenario_billing_staff_allowed_doctor_denied_on_invoices() {
    let g = guard();
    let billing = identity(Role::BillingStaff);
    let doctor = identity(Role::Doctor);
    assert_eq!(
        g.authorize(Some(&billing), "/billing/invoices", Method::Get),
        Decision::Allow
    );
    assert_eq!(
        g.authorize(Some(&doctor), "/billing/invoices", Method::Get),
        Decision::Deny(DenyReason::RoleNotPermitted)
    );
}

#[test]
fn scenario_unknown_route_is_404_with_any_identity() {
    let g = guard();
    for role in ALL_ROLES {
        let id = identity(*role);
        let d = g.authorize(Some(&id), "/no-such-route", Method::Get);
        let Decision::Deny(reason) = d else { panic!("expected deny") };
        assert_eq!(reason, DenyReason::NoPolicy);
        assert_eq!(reason.http_status(), 404);
    }
}

#[test]
fn authorize_twice_yields_identical_outcomes() {
    let g = guard();
    for entry in g.table().entries() {
        let concrete = entry.path().replace(":id", "42");
        for role in ALL_ROLES {
            let id = identity(*role);
            let a = g.authorize(Some(&id), &concrete, entry.method());
            let b = g.authorize(Some(&id), &concrete, entry.method());
            assert_eq!(a, b, "{role} on {} {}", entry.method(), entry.path());
        }
    }
}
