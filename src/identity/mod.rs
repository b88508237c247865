//! Central identity handling: the resolved principal, the stateless session
//! resolver, and the credential-issuing provider.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod resolver;
mod provider;

pub use principal::Identity;
pub use resolver::SessionResolver;
pub use provider::{hash_password, verify_password, AuthProvider, LocalAuthProvider, LoginRequest, LoginResponse};
