//! Latest-value broadcast of the current session.
//!
//! Subscribers that attach after a transition immediately observe the
//! current value, so components wired up late (the access guard, UI) are
//! never left without an initial state. There is no event queue; only the
//! most recent value is retained.

use tokio::sync::watch;

use super::Credential;

/// Sender side of the session channel. Owned by the session store.
pub struct SessionPublisher {
    tx: watch::Sender<Option<Credential>>,
}

impl SessionPublisher {
    /// Create a publisher with no session present
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(None),
        }
    }

    /// Replace the current value and notify all subscribers
    pub fn publish(&self, value: Option<Credential>) {
        self.tx.send_replace(value);
    }

    /// Latest published value
    pub fn current(&self) -> Option<Credential> {
        self.tx.borrow().clone()
    }

    /// Attach a new subscriber; it sees the current value immediately
    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SessionPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver handle onto the session channel
#[derive(Clone)]
pub struct SessionWatch {
    rx: watch::Receiver<Option<Credential>>,
}

impl SessionWatch {
    /// Latest published value
    pub fn current(&self) -> Option<Credential> {
        self.rx.borrow().clone()
    }

    /// True if the latest published value is a present session
    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait until a value newer than the last one seen is published.
    /// Fails only if the store (the sender) has been dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn credential(email: &str) -> Credential {
        Credential {
            email: email.into(),
            user_id: "uid".into(),
            token: "tok".into(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }

    #[test]
    fn late_subscriber_sees_current_value() {
        let publisher = SessionPublisher::new();
        publisher.publish(Some(credential("early@example.com")));

        let watch = publisher.subscribe();
        assert!(watch.is_authenticated());
        assert_eq!(
            watch.current().map(|c| c.email),
            Some("early@example.com".to_string())
        );
    }

    #[test]
    fn initial_state_is_absent() {
        let publisher = SessionPublisher::new();
        assert!(!publisher.subscribe().is_authenticated());
        assert!(publisher.current().is_none());
    }

    #[tokio::test]
    async fn all_subscribers_observe_each_publish() {
        let publisher = SessionPublisher::new();
        let mut first = publisher.subscribe();
        let mut second = publisher.subscribe();

        publisher.publish(Some(credential("a@example.com")));

        first.changed().await.expect("publisher alive");
        second.changed().await.expect("publisher alive");
        assert!(first.is_authenticated());
        assert!(second.is_authenticated());

        publisher.publish(None);
        first.changed().await.expect("publisher alive");
        assert!(!first.is_authenticated());
    }
}
