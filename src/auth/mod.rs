//! Session lifecycle: credential, store, publisher, and access guard.
//!
//! This module provides:
//! - `Credential`: one authenticated session with token and absolute expiry
//! - `SessionStore`: exclusive owner of the current session and its timer
//! - `SessionPublisher` / `SessionWatch`: latest-value broadcast of session state
//! - `AccessGuard`: navigation gating driven by the published state
//!
//! Sessions are persisted through a key-value store and restored across
//! process restarts.

pub mod credential;
pub mod guard;
pub mod publisher;
pub mod store;

pub use credential::{Credential, PersistedCredential};
pub use guard::{Access, AccessGuard};
pub use publisher::{SessionPublisher, SessionWatch};
pub use store::{SessionStore, USER_DATA_KEY};

/// Navigation capability consumed on logout and by guard redirects.
/// The router itself lives outside this crate.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}
