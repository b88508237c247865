//! Role registry and the capability layer.
//!
//! Roles are a closed set: a credential carrying any other string fails
//! verification at the boundary instead of propagating into policy lookups.
//! Access rules are expressed through capabilities: each role maps to a static
//! capability set and each policy entry names the one capability it requires.
//! Admin holds the wildcard set, so "Admin can do everything" is stated once
//! here instead of being repeated in every policy entry.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Doctor,
    Patient,
    Nurse,
    Receptionist,
    LabTechnician,
    LabSupervisor,
    BillingStaff,
    InsuranceStaff,
    Pharmacist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    ViewOwnRecords,
    ViewClinicalRecords,
    EditClinicalRecords,
    ManageAppointments,
    ViewLabQueue,
    ProcessLabOrders,
    ApproveLabResults,
    ManageBilling,
    ViewInvoices,
    DispenseMedication,
    ManageUsers,
}

pub const ALL_ROLES: &[Role] = &[
    Role::Admin,
    Role::Doctor,
    Role::Patient,
    Role::Nurse,
    Role::Receptionist,
    Role::LabTechnician,
    Role::LabSupervisor,
    Role::BillingStaff,
    Role::InsuranceStaff,
    Role::Pharmacist,
];

pub const ALL_CAPABILITIES: &[Capability] = &[
    Capability::ViewOwnRecords,
    Capability::ViewClinicalRecords,
    Capability::EditClinicalRecords,
    Capability::ManageAppointments,
    Capability::ViewLabQueue,
    Capability::ProcessLabOrders,
    Capability::ApproveLabResults,
    Capability::ManageBilling,
    Capability::ViewInvoices,
    Capability::DispenseMedication,
    Capability::ManageUsers,
];

/// Map a role to its capability set. Flat lookup table, no inheritance.
fn capabilities_for(role: Role) -> &'static [Capability] {
    match role {
        // Admin is handled by the wildcard in `has_capability`; listing the
        // full set here keeps `capabilities()` accurate for introspection.
        Role::Admin => ALL_CAPABILITIES,
        Role::Doctor => &[
            Capability::ViewClinicalRecords,
            Capability::EditClinicalRecords,
            Capability::ManageAppointments,
        ],
        Role::Patient => &[Capability::ViewOwnRecords, Capability::ManageAppointments],
        Role::Nurse => &[Capability::ViewClinicalRecords, Capability::ManageAppointments],
        Role::Receptionist => &[Capability::ManageAppointments, Capability::ViewInvoices],
        Role::LabTechnician => &[Capability::ViewLabQueue, Capability::ProcessLabOrders],
        Role::LabSupervisor => &[
            Capability::ViewLabQueue,
            Capability::ProcessLabOrders,
            Capability::ApproveLabResults,
        ],
        Role::BillingStaff => &[Capability::ManageBilling, Capability::ViewInvoices],
        Role::InsuranceStaff => &[Capability::ViewInvoices],
        Role::Pharmacist => &[Capability::DispenseMedication],
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
            Role::Patient => "Patient",
            Role::Nurse => "Nurse",
            Role::Receptionist => "Receptionist",
            Role::LabTechnician => "LabTechnician",
            Role::LabSupervisor => "LabSupervisor",
            Role::BillingStaff => "BillingStaff",
            Role::InsuranceStaff => "InsuranceStaff",
            Role::Pharmacist => "Pharmacist",
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        capabilities_for(*self)
    }

    /// Admin shortcut: wildcard over every capability.
    pub fn has_capability(&self, cap: Capability) -> bool {
        if *self == Role::Admin {
            return true;
        }
        capabilities_for(*self).contains(&cap)
    }

    /// Default landing page used by the client gate's redirect policy.
    pub fn default_landing(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Doctor => "/doctor/dashboard",
            Role::Patient => "/portal/home",
            Role::Nurse => "/nurse/dashboard",
            Role::Receptionist => "/front-desk",
            Role::LabTechnician => "/lab/queue",
            Role::LabSupervisor => "/lab/overview",
            Role::BillingStaff => "/billing/invoices",
            Role::InsuranceStaff => "/insurance/claims",
            Role::Pharmacist => "/pharmacy/orders",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ROLES
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_wildcard_covers_every_capability() {
        for cap in ALL_CAPABILITIES {
            assert!(Role::Admin.has_capability(*cap), "Admin missing {:?}", cap);
        }
    }

    #[test]
    fn non_admin_roles_are_bounded() {
        // No non-admin role holds the full set.
        for role in ALL_ROLES.iter().filter(|r| **r != Role::Admin) {
            assert!(
                ALL_CAPABILITIES.iter().any(|c| !role.has_capability(*c)),
                "{} should not hold every capability",
                role
            );
        }
    }

    #[test]
    fn role_string_round_trip() {
        for role in ALL_ROLES {
            assert_eq!(role.as_str().parse::<Role>(), Ok(*role));
        }
        assert!("Technician".parse::<Role>().is_err());
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn scenario_capability_expectations() {
        assert!(Role::Doctor.has_capability(Capability::ViewClinicalRecords));
        assert!(!Role::Patient.has_capability(Capability::ViewClinicalRecords));
        assert!(Role::LabTechnician.has_capability(Capability::ViewLabQueue));
        assert!(Role::BillingStaff.has_capability(Capability::ViewInvoices));
        assert!(!Role::Doctor.has_capability(Capability::ViewInvoices));
    }

    #[test]
    fn every_role_has_a_landing_page() {
        for role in ALL_ROLES {
            assert!(role.default_landing().starts_with('/'));
        }
    }
}
