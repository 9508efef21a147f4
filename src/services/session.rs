//! Client-side session state.
//!
//! Holds the signed-in identity (or its absence) and broadcasts every
//! change to subscribers. Subscribers stop listening by dropping their
//! [`SessionStream`].

use crate::models::account::AuthUser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct Session {
    tx: Arc<watch::Sender<Option<AuthUser>>>,
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.tx.borrow().clone()
    }

    pub fn uid(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|user| user.uid.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replace the current identity and notify subscribers.
    pub(crate) fn set(&self, user: Option<AuthUser>) {
        debug!(
            "session set to {}",
            user.as_ref().map(|u| u.uid.as_str()).unwrap_or("<none>")
        );
        self.tx.send_replace(user);
    }

    pub fn subscribe(&self) -> SessionStream {
        SessionStream {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side of the session broadcast.
pub struct SessionStream {
    rx: watch::Receiver<Option<AuthUser>>,
}

impl SessionStream {
    pub fn current(&self) -> Option<AuthUser> {
        self.rx.borrow().clone()
    }

    /// Wait for the next change and return the new state.
    ///
    /// Rapid successive changes are coalesced into the latest one.
    /// Returns `None` once the session owner is gone.
    pub async fn changed(&mut self) -> Option<Option<AuthUser>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
