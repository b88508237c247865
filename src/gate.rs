//! The client-side route gate: an advisory mirror of the guard, for UX only.
//!
//! The gate prevents rendering screens a user cannot use and decides where to
//! redirect instead. It reads the same policy table as the guard; it is never
//! the enforcement point. Every privileged network call is re-checked
//! server-side regardless of what the gate concluded.

use std::sync::Arc;

use crate::identity::Identity;
use crate::policy::{Method, PolicyTable};
use crate::roles::Role;

/// Where to send a caller the gate turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Not logged in: go to login, preserving the intended destination.
    Login { next: String },
    /// Logged in with the wrong role: go to that role's landing page. Never a
    /// generic error page that confirms the attempted resource exists.
    Landing(&'static str),
}

/// What a navigation should do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision {
    Render,
    /// Identity still resolving: render nothing (or a loading indicator),
    /// never protected content.
    Hold,
    RedirectTo(Redirect),
}

/// Authentication state of one browser session.
///
/// `Unauthenticated -> Authenticating -> {Authenticated, Unauthenticated}`.
/// A 401 from any API call drops back to `Unauthenticated` and clears the
/// cached identity; a 403 denies the action without touching the state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(Identity),
}

impl SessionState {
    pub fn begin_login(&mut self) {
        *self = SessionState::Authenticating;
    }

    pub fn login_succeeded(&mut self, identity: Identity) {
        *self = SessionState::Authenticated(identity);
    }

    pub fn login_failed(&mut self) {
        *self = SessionState::Unauthenticated;
    }

    /// Synchronous: the cached identity is gone before any redirect happens,
    /// so a protected view can never flash with stale credentials.
    pub fn logout(&mut self) {
        *self = SessionState::Unauthenticated;
    }

    /// Feed back an observed API response status.
    pub fn observe_status(&mut self, status: u16) {
        if status == 401 {
            *self = SessionState::Unauthenticated;
        }
        // 403 denies one action; authentication state is unchanged.
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(id) => Some(id),
            _ => None,
        }
    }
}

/// Outcome of the asynchronous "who am I" fetch the UI performs on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityFetch {
    Loading,
    Resolved(Option<Identity>),
    Failed,
}

#[derive(Clone)]
pub struct RouteGate {
    table: Arc<PolicyTable>,
}

impl RouteGate {
    pub fn new(table: Arc<PolicyTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Advisory check mirroring the server guard over the same table.
    pub fn can_render(&self, identity: Option<&Identity>, path: &str, method: Method) -> bool {
        let Some(identity) = identity else { return false };
        match self.table.lookup(path, method) {
            Some(entry) => identity.role.has_capability(entry.capability()),
            None => false,
        }
    }

    /// Allowed roles for a UI route, for menu building. Derived from the same
    /// table the server enforces, never hand-maintained.
    pub fn allowed_roles(&self, path: &str, method: Method) -> Vec<Role> {
        self.table
            .lookup(path, method)
            .map(|e| e.allowed_roles())
            .unwrap_or_default()
    }

    pub fn redirect(&self, identity: Option<&Identity>, path: &str) -> Option<Redirect> {
        match identity {
            None => Some(Redirect::Login { next: path.to_string() }),
            Some(id) => {
                if self.can_render(Some(id), path, Method::Get) {
                    None
                } else {
                    Some(Redirect::Landing(id.role.default_landing()))
                }
            }
        }
    }

    /// Decide a navigation given the current identity fetch state.
    pub fn render_decision(&self, fetch: &IdentityFetch, path: &str) -> RenderDecision {
        match fetch {
            IdentityFetch::Loading => RenderDecision::Hold,
            IdentityFetch::Failed => {
                RenderDecision::RedirectTo(Redirect::Login { next: path.to_string() })
            }
            IdentityFetch::Resolved(identity) => match self.redirect(identity.as_ref(), path) {
                None => RenderDecision::Render,
                Some(r) => RenderDecision::RedirectTo(r),
            },
        }
    }
}
