//! Owner of the current session and its lifecycle.
//!
//! The store is the only component that mutates session state. Everything
//! else observes through the publisher. A session enters through a
//! successful sign-in/sign-up or through `restore()` at process start, and
//! leaves through `logout()` or the expiry timer; both exits look identical
//! to subscribers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{AuthError, IdentityApi, IdentityResponse};
use crate::storage::KeyValueStore;

use super::credential::PersistedCredential;
use super::{AccessGuard, Credential, Navigator, SessionPublisher, SessionWatch};

/// Storage key for the persisted session record
pub const USER_DATA_KEY: &str = "userData";

/// Mutable session state, always accessed under the lock.
///
/// `request_seq` stamps each outbound sign-in/sign-up and is bumped whenever
/// the session is cleared, so a response that resolves after a logout fails
/// the stamp check instead of resurrecting the session. `session_gen` stamps
/// the armed expiry timer so a timer that already woke when it was cancelled
/// cannot fire against a newer session.
struct Inner {
    request_seq: u64,
    session_gen: u64,
    expiry_task: Option<JoinHandle<()>>,
}

struct Shared {
    publisher: SessionPublisher,
    storage: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    auth_path: String,
    inner: Mutex<Inner>,
}

/// Session store. Cheap to clone when the identity client is; all clones
/// share the same session state and publisher.
pub struct SessionStore<I> {
    api: I,
    shared: Arc<Shared>,
}

impl<I: Clone> Clone for SessionStore<I> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<I: IdentityApi> SessionStore<I> {
    /// Create a store with no session present. Call `restore()` once at
    /// startup to pick up a persisted session.
    pub fn new(
        api: I,
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        auth_path: impl Into<String>,
    ) -> Self {
        Self {
            api,
            shared: Arc::new(Shared {
                publisher: SessionPublisher::new(),
                storage,
                navigator,
                auth_path: auth_path.into(),
                inner: Mutex::new(Inner {
                    request_seq: 0,
                    session_gen: 0,
                    expiry_task: None,
                }),
            }),
        }
    }

    /// Attach an observer; it immediately sees the current session state
    pub fn subscribe(&self) -> SessionWatch {
        self.shared.publisher.subscribe()
    }

    /// Latest published session state
    pub fn current(&self) -> Option<Credential> {
        self.shared.publisher.current()
    }

    /// Build an access guard wired to this store's publisher and auth path
    pub fn guard(&self) -> AccessGuard {
        AccessGuard::new(self.subscribe(), self.shared.auth_path.clone())
    }

    /// Sign in to an existing account and activate the resulting session.
    /// On failure the prior session state is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, AuthError> {
        let issued = self.shared.issue_request();
        let response = self.api.sign_in(email, password).await?;
        self.shared.complete(issued, response)
    }

    /// Register a new account and activate the resulting session.
    /// On failure the prior session state is left untouched.
    pub async fn signup(&self, email: &str, password: &str) -> Result<Credential, AuthError> {
        let issued = self.shared.issue_request();
        let response = self.api.sign_up(email, password).await?;
        self.shared.complete(issued, response)
    }

    /// Restore a persisted session, called once at process start.
    ///
    /// Must run inside a tokio runtime: re-activating a session spawns the
    /// expiry timer task, and spawning outside a runtime context panics.
    ///
    /// A missing, malformed, or already-expired record publishes "absent";
    /// the latter two also remove the record. A still-valid record is
    /// re-activated with the expiry timer armed for the remaining duration
    /// only, not the original full lifetime.
    pub fn restore(&self) {
        let shared = &self.shared;

        let raw = match shared.storage.get(USER_DATA_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                shared.publisher.publish(None);
                return;
            }
            Err(err) => {
                warn!(error = %err, "failed to read persisted session record");
                shared.publisher.publish(None);
                return;
            }
        };

        let credential = serde_json::from_str::<PersistedCredential>(&raw)
            .ok()
            .and_then(PersistedCredential::into_credential);

        let Some(credential) = credential else {
            // Corrupt or token-less record: recover locally by discarding it.
            warn!("discarding malformed persisted session record");
            shared.discard_record();
            shared.publisher.publish(None);
            return;
        };

        if !credential.is_valid(Utc::now()) {
            // The timer that would have cleaned this up never fired in the
            // old process, so clean up lazily here.
            debug!("persisted session already expired, discarding");
            shared.discard_record();
            shared.publisher.publish(None);
            return;
        }

        let mut inner = shared.lock();
        shared.activate(&mut inner, credential);
    }

    /// Clear the session and redirect to the auth entry path.
    /// Idempotent: a logout with no session present only issues the redirect.
    pub fn logout(&self) {
        let shared = &self.shared;
        {
            let mut inner = shared.lock();
            shared.clear(&mut inner);
        }
        debug!("logged out");
        shared.navigator.navigate_to(&shared.auth_path);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stamp an outbound sign-in/sign-up request
    fn issue_request(&self) -> u64 {
        let mut inner = self.lock();
        inner.request_seq += 1;
        inner.request_seq
    }

    /// Finish a sign-in/sign-up whose response just arrived. The stamp
    /// check and activation happen under one lock acquisition, so a logout
    /// or newer request processed in the meantime wins.
    fn complete(
        self: &Arc<Self>,
        issued: u64,
        response: IdentityResponse,
    ) -> Result<Credential, AuthError> {
        let credential = Credential::from_response(response, Utc::now());
        let mut inner = self.lock();
        if inner.request_seq != issued {
            debug!("discarding stale sign-in response");
            return Err(AuthError::Superseded);
        }
        self.activate(&mut inner, credential.clone());
        Ok(credential)
    }

    /// Install a credential as the current session: persist it, arm the
    /// single expiry timer, publish "present". Any previously armed timer
    /// is cancelled first; at most one timer is ever live.
    fn activate(self: &Arc<Self>, inner: &mut Inner, credential: Credential) {
        if let Some(task) = inner.expiry_task.take() {
            task.abort();
        }
        inner.session_gen += 1;

        match serde_json::to_string(&PersistedCredential::from(&credential)) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(USER_DATA_KEY, &raw) {
                    warn!(error = %err, "failed to persist session record");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize session record"),
        }

        let remaining_ms = credential.remaining_ms(Utc::now());
        inner.expiry_task = Some(self.arm_timer(remaining_ms, inner.session_gen));

        debug!(user_id = %credential.user_id, remaining_ms, "session activated");
        self.publisher.publish(Some(credential));
    }

    fn arm_timer(self: &Arc<Self>, remaining_ms: u64, generation: u64) -> JoinHandle<()> {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(remaining_ms)).await;
            shared.expire(generation);
        })
    }

    /// Expiry timer callback: equivalent to logout, including the redirect.
    /// A timer whose generation stamp no longer matches was cancelled after
    /// it woke and must not touch the newer session.
    fn expire(&self, generation: u64) {
        {
            let mut inner = self.lock();
            if inner.session_gen != generation {
                return;
            }
            debug!("session expired");
            self.clear(&mut inner);
        }
        self.navigator.navigate_to(&self.auth_path);
    }

    /// Transition to "absent": cancel the timer, invalidate in-flight
    /// requests and stale timers, drop the persisted record, publish.
    fn clear(&self, inner: &mut Inner) {
        if let Some(task) = inner.expiry_task.take() {
            task.abort();
        }
        inner.session_gen += 1;
        inner.request_seq += 1;
        self.discard_record();
        self.publisher.publish(None);
    }

    fn discard_record(&self) {
        if let Err(err) = self.storage.remove(USER_DATA_KEY) {
            warn!(error = %err, "failed to remove persisted session record");
        }
    }
}
