//! The declarative route policy table.
//!
//! One entry per protected endpoint: `{method, path template, capability}`.
//! The allowed role set of an entry is derived from the capability layer, so
//! policy authors never repeat "Admin" on every line. The table is immutable
//! once constructed; ambiguous overlap between equally specific entries is a
//! construction error, never a request-time decision.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::roles::{Capability, Role, ALL_ROLES};

use super::template::{split_path, PathTemplate};

/// Exact-method matching over the verbs the portal uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolicyEntry {
    method: Method,
    template: PathTemplate,
    capability: Capability,
}

impl PolicyEntry {
    pub fn new(method: Method, template: &str, capability: Capability) -> AppResult<Self> {
        Ok(Self { method, template: PathTemplate::parse(template)?, capability })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        self.template.raw()
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Roles permitted on this entry, derived from the capability layer.
    pub fn allowed_roles(&self) -> Vec<Role> {
        ALL_ROLES
            .iter()
            .copied()
            .filter(|r| r.has_capability(self.capability))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: Vec<PolicyEntry>,
}

impl PolicyTable {
    /// Build a table, rejecting ambiguous configuration up front.
    ///
    /// Two entries are ambiguous when they share a method, some concrete path
    /// matches both, and neither is more specific than the other. An entry
    /// that shadows a less specific one (`/medical-records/enhanced` next to
    /// `/medical-records/:id`) is fine: the more specific entry wins lookups.
    pub fn new(entries: Vec<PolicyEntry>) -> AppResult<Self> {
        for (i, a) in entries.iter().enumerate() {
            for b in entries.iter().skip(i + 1) {
                if a.method != b.method {
                    continue;
                }
                if a.template.overlaps(&b.template)
                    && a.template.param_count() == b.template.param_count()
                {
                    return Err(AppError::config(
                        "ambiguous_policy".to_string(),
                        format!(
                            "entries '{} {}' and '{} {}' are equally specific and overlap",
                            a.method, a.template.raw(), b.method, b.template.raw()
                        ),
                    ));
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PolicyEntry] {
        &self.entries
    }

    /// Find the policy entry governing a concrete request, or `None` when no
    /// entry matches (`NoPolicy`, which callers treat as implicit Deny).
    pub fn lookup(&self, path: &str, method: Method) -> Option<&PolicyEntry> {
        let segments = split_path(path);
        self.entries
            .iter()
            .filter(|e| e.method == method && e.template.matches(&segments))
            .min_by_key(|e| e.template.param_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PolicyTable {
        PolicyTable::new(vec![
            PolicyEntry::new(Method::Get, "/medical-records/enhanced", Capability::ViewClinicalRecords).unwrap(),
            PolicyEntry::new(Method::Get, "/medical-records/:id", Capability::ViewClinicalRecords).unwrap(),
            PolicyEntry::new(Method::Put, "/medical-records/:id", Capability::EditClinicalRecords).unwrap(),
            PolicyEntry::new(Method::Get, "/lab/queue", Capability::ViewLabQueue).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn method_is_part_of_the_key() {
        let t = table();
        assert!(t.lookup("/medical-records/7", Method::Get).is_some());
        assert!(t.lookup("/medical-records/7", Method::Put).is_some());
        assert!(t.lookup("/medical-records/7", Method::Delete).is_none());
        assert!(t.lookup("/lab/queue", Method::Post).is_none());
    }

    #[test]
    fn more_specific_entry_wins() {
        let t = table();
        let hit = t.lookup("/medical-records/enhanced", Method::Get).unwrap();
        assert_eq!(hit.path(), "/medical-records/enhanced");
        let hit = t.lookup("/medical-records/123", Method::Get).unwrap();
        assert_eq!(hit.path(), "/medical-records/:id");
    }

    #[test]
    fn equally_specific_overlap_fails_construction() {
        let err = PolicyTable::new(vec![
            PolicyEntry::new(Method::Get, "/lab/:section", Capability::ViewLabQueue).unwrap(),
            PolicyEntry::new(Method::Get, "/:area/queue", Capability::ViewLabQueue).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err.code_str(), "ambiguous_policy");
    }

    #[test]
    fn duplicate_entry_fails_construction() {
        let err = PolicyTable::new(vec![
            PolicyEntry::new(Method::Get, "/lab/queue", Capability::ViewLabQueue).unwrap(),
            PolicyEntry::new(Method::Get, "/lab/queue", Capability::ProcessLabOrders).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err.code_str(), "ambiguous_policy");
    }

    #[test]
    fn allowed_roles_always_include_admin() {
        for entry in table().entries() {
            assert!(entry.allowed_roles().contains(&Role::Admin));
        }
    }

    #[test]
    fn unknown_route_has_no_policy() {
        assert!(table().lookup("/no-such-route", Method::Get).is_none());
    }
}
