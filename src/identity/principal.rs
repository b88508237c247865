use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// The resolved, authenticated caller for one request. Produced only by the
/// session resolver; never mutated, only replaced by re-authentication. The
/// embedded role is authoritative for the request: a role change takes effect
/// when the credential is reissued, not before.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
