//! Navigation-time gating of protected destinations.

use tracing::debug;

use super::SessionWatch;

/// Outcome of a guard decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect { to: String },
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }
}

/// Gate invoked by the navigation layer before entering a protected route.
///
/// The guard decides purely from the latest published session value. It
/// deliberately does not re-check `expires_at`: the session store removes
/// expired sessions via its timer, and a second expiry policy here could
/// diverge from it.
pub struct AccessGuard {
    session: SessionWatch,
    auth_path: String,
}

impl AccessGuard {
    pub fn new(session: SessionWatch, auth_path: impl Into<String>) -> Self {
        Self {
            session,
            auth_path: auth_path.into(),
        }
    }

    /// Allow if a session is present, otherwise redirect to the auth entry path
    pub fn can_enter(&self, destination: &str) -> Access {
        if self.session.is_authenticated() {
            Access::Allow
        } else {
            debug!(destination, "unauthenticated navigation, redirecting");
            Access::Redirect {
                to: self.auth_path.clone(),
            }
        }
    }
}
