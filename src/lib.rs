//! Authentication session lifecycle.
//!
//! This crate acquires a credential from a remote identity provider,
//! persists it, schedules its expiry, restores it across process restarts,
//! and gates navigation on its validity:
//!
//! - [`IdentityClient`] talks to the provider's sign-up/sign-in endpoints
//! - [`SessionStore`] owns the current [`Credential`] and its expiry timer
//! - [`SessionWatch`] broadcasts the latest session state to any subscriber
//! - [`AccessGuard`] allows or redirects navigation based on that state
//!
//! ```no_run
//! use std::sync::Arc;
//! use authkeep::{Config, FileStore, IdentityClient, Navigator, SessionStore};
//!
//! struct LogNavigator;
//!
//! impl Navigator for LogNavigator {
//!     fn navigate_to(&self, path: &str) {
//!         println!("navigating to {path}");
//!     }
//! }
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let api = IdentityClient::with_base_url(
//!     config.provider_url(),
//!     config.api_key().unwrap_or_default(),
//! )?;
//! let storage = Arc::new(FileStore::open(Config::storage_dir()?)?);
//! let store = SessionStore::new(api, storage, Arc::new(LogNavigator), config.auth_route());
//!
//! store.restore();
//! let guard = store.guard();
//! let _decision = guard.can_enter("/recipes");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod storage;

pub use api::{AuthError, IdentityApi, IdentityClient, IdentityResponse};
pub use auth::{
    Access, AccessGuard, Credential, Navigator, SessionPublisher, SessionStore, SessionWatch,
};
pub use config::Config;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
