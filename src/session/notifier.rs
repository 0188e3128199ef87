//! Fan-out of the "tokens cleared" event.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

/// Identifies a registered listener so it can be removed later.
pub type ListenerId = String;

/// Callback run when the credential is cleared.
pub type TokensClearedCallback = Arc<dyn Fn() + Send + Sync>;

/// Registry of listeners interested in sign-out.
///
/// Listeners are called synchronously, in registration order, on a snapshot
/// of the registry taken before any of them runs. A listener may therefore
/// subscribe or unsubscribe from inside its own callback; the change applies
/// to the next notification.
#[derive(Default)]
pub struct SessionNotifier {
    listeners: Mutex<Vec<(ListenerId, TokensClearedCallback)>>,
}

impl std::fmt::Debug for SessionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl SessionNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `id`, replacing any callback with that id.
    pub fn subscribe<F>(&self, id: impl Into<ListenerId>, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = id.into();
        let callback: TokensClearedCallback = Arc::new(callback);
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        match listeners.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = callback,
            None => listeners.push((id, callback)),
        }
    }

    /// Remove the listener registered under `id`. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: &str) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(existing, _)| existing != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Invoke every listener once.
    pub(crate) fn notify(&self) {
        let snapshot: Vec<(ListenerId, TokensClearedCallback)> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        tracing::debug!("Notifying {} tokens-cleared listener(s)", snapshot.len());
        for (id, callback) in snapshot {
            // A panicking listener is logged and skipped.
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                tracing::warn!("Tokens-cleared listener '{}' panicked", id);
            }
        }
    }
}
