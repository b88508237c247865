//! wardgate: route authorization for a hospital portal.
//!
//! One declarative policy table drives two read-only views: the server-side
//! guard (`guard`), which is the authoritative trust boundary, and the
//! client-side gate (`gate`), which only exists so the UI never renders a
//! screen the user cannot use. Identities come from stateless signed
//! credentials; unknown routes are unauthorized by default.

pub mod error;
pub mod roles;
pub mod policy;
pub mod identity;
pub mod guard;
pub mod gate;
pub mod server;
