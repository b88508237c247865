//! The server-side authorization guard: the authoritative trust boundary.
//!
//! `authorize` is pure computation over immutable inputs: it performs no I/O,
//! holds no locks, and depends on nothing but the identity, path, method, and
//! the policy table fixed at startup. Deny is a normal return value, not an
//! error; it happens on every unauthorized request and must stay cheap.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::identity::Identity;
use crate::policy::{Method, PolicyTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No valid credential. Never reveals whether the resource exists.
    Unauthenticated,
    /// Valid credential, wrong role.
    RoleNotPermitted,
    /// No matching policy entry: implicit deny, exposed as 404 so probing an
    /// unconfigured route confirms nothing about its existence.
    NoPolicy,
}

impl DenyReason {
    pub fn http_status(&self) -> u16 {
        match self {
            DenyReason::Unauthenticated => 401,
            DenyReason::RoleNotPermitted => 403,
            DenyReason::NoPolicy => 404,
        }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::RoleNotPermitted => "role_not_permitted",
            DenyReason::NoPolicy => "no_policy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[derive(Clone)]
pub struct Guard {
    table: Arc<PolicyTable>,
}

impl Guard {
    pub fn new(table: Arc<PolicyTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Decide a request. Unauthenticated callers are denied before policy
    /// lookup; unknown routes are unauthorized by default.
    pub fn authorize(&self, identity: Option<&Identity>, path: &str, method: Method) -> Decision {
        let Some(identity) = identity else {
            return Decision::Deny(DenyReason::Unauthenticated);
        };
        let Some(entry) = self.table.lookup(path, method) else {
            debug!(subject = %identity.subject, %method, path, "guard.no_policy");
            return Decision::Deny(DenyReason::NoPolicy);
        };
        if identity.role.has_capability(entry.capability()) {
            Decision::Allow
        } else {
            debug!(
                subject = %identity.subject,
                role = %identity.role,
                %method,
                path,
                "guard.role_not_permitted"
            );
            Decision::Deny(DenyReason::RoleNotPermitted)
        }
    }
}
