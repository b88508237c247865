//! Loading the policy table from its declarative JSON form.
//!
//! The JSON document is the one artifact a policy author edits:
//!
//! ```json
//! {
//!   "entries": [
//!     {"method": "GET", "path": "/lab/queue", "capability": "ViewLabQueue"}
//!   ]
//! }
//! ```
//!
//! Loading and validation work without a running server, so policy
//! correctness is testable in isolation. Both the server-side guard and the
//! client-side gate consume the table this produces; there is no second,
//! hand-maintained copy of the rules.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::roles::Capability;

use super::table::{Method, PolicyEntry, PolicyTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub entries: Vec<PolicyEntryDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyEntryDoc {
    pub method: Method,
    pub path: String,
    pub capability: Capability,
}

impl PolicyDocument {
    /// Validate the document and build the immutable table.
    pub fn into_table(self) -> AppResult<PolicyTable> {
        let mut entries = Vec::with_capacity(self.entries.len());
        for doc in self.entries {
            entries.push(PolicyEntry::new(doc.method, &doc.path, doc.capability)?);
        }
        PolicyTable::new(entries)
    }
}

pub fn from_json_str(json: &str) -> AppResult<PolicyTable> {
    let doc: PolicyDocument = serde_json::from_str(json)?;
    doc.into_table()
}

pub fn from_file(path: &Path) -> AppResult<PolicyTable> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        AppError::config(
            "policy_file".to_string(),
            format!("failed to read policy file {}: {e}", path.display()),
        )
    })?;
    from_json_str(&json)
}

/// Built-in policy for the portal's protected routes. Used when no policy
/// file is configured, and by the test suite as the single source of truth.
pub fn default_portal_policy() -> PolicyTable {
    let specs: &[(Method, &str, Capability)] = &[
        // Medical records
        (Method::Get, "/medical-records/enhanced", Capability::ViewClinicalRecords),
        (Method::Get, "/medical-records/mine", Capability::ViewOwnRecords),
        (Method::Get, "/medical-records/:id", Capability::ViewClinicalRecords),
        (Method::Post, "/medical-records", Capability::EditClinicalRecords),
        (Method::Put, "/medical-records/:id", Capability::EditClinicalRecords),
        // Appointments
        (Method::Get, "/appointments", Capability::ManageAppointments),
        (Method::Post, "/appointments", Capability::ManageAppointments),
        (Method::Put, "/appointments/:id", Capability::ManageAppointments),
        (Method::Delete, "/appointments/:id", Capability::ManageAppointments),
        // Lab
        (Method::Get, "/lab/queue", Capability::ViewLabQueue),
        (Method::Post, "/lab/queue/:id/results", Capability::ProcessLabOrders),
        (Method::Post, "/lab/queue/:id/approve", Capability::ApproveLabResults),
        // Billing
        (Method::Get, "/billing/invoices", Capability::ViewInvoices),
        (Method::Post, "/billing/invoices", Capability::ManageBilling),
        (Method::Put, "/billing/invoices/:id", Capability::ManageBilling),
        // Pharmacy
        (Method::Get, "/pharmacy/prescriptions", Capability::DispenseMedication),
        (Method::Post, "/pharmacy/prescriptions/:id/dispense", Capability::DispenseMedication),
        // Administration
        (Method::Get, "/admin/users", Capability::ManageUsers),
        (Method::Post, "/admin/users", Capability::ManageUsers),
        (Method::Delete, "/admin/users/:id", Capability::ManageUsers),
    ];
    let entries = specs
        .iter()
        .map(|(m, p, c)| PolicyEntry::new(*m, p, *c).expect("built-in template is valid"))
        .collect();
    PolicyTable::new(entries).expect("built-in policy is unambiguous")
}
