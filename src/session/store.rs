//! In-memory credential snapshot backed by a durable medium.

use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

use super::notifier::{ListenerId, SessionNotifier};
use crate::auth::{Credentials, UserSnapshot};
use crate::traits::{CredentialsError, CredentialsProvider};

/// The single source of truth for the current credential.
///
/// Reads are served from an in-memory snapshot and never wait on the medium.
/// Writes go to the medium first and replace the snapshot only when the
/// medium accepted them, so readers see either the whole old credential or
/// the whole new one.
pub struct CredentialStore {
    provider: Arc<dyn CredentialsProvider>,
    snapshot: RwLock<Option<Arc<Credentials>>>,
    /// Serializes writers across the medium write and the snapshot swap.
    write_lock: Mutex<()>,
    notifier: SessionNotifier,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl CredentialStore {
    /// A signed-out store over `provider`.
    pub fn new(provider: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            provider,
            snapshot: RwLock::new(None),
            write_lock: Mutex::new(()),
            notifier: SessionNotifier::new(),
        }
    }

    /// A store initialized from whatever `provider` holds.
    ///
    /// A load failure is logged and the store starts signed out.
    pub async fn load(provider: Arc<dyn CredentialsProvider>) -> Self {
        let initial = match provider.load().await {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!("Failed to load stored credentials, starting signed out: {}", e);
                None
            }
        };

        let store = Self::new(provider);
        if let Some(credentials) = initial {
            tracing::debug!(
                "Loaded stored credentials for user {}",
                credentials.user.id().unwrap_or_else(|| "<unknown>".to_string())
            );
            store.replace_snapshot(Some(Arc::new(credentials)));
        }
        store
    }

    fn current(&self) -> Option<Arc<Credentials>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_snapshot(&self, credentials: Option<Arc<Credentials>>) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = credentials;
    }

    pub fn access_token(&self) -> Option<String> {
        self.current().map(|c| c.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.current().map(|c| c.refresh_token.clone())
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.current().map(|c| (*c).clone())
    }

    pub fn user(&self) -> Option<UserSnapshot> {
        self.current().map(|c| c.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Persist a new credential and make it current.
    ///
    /// On a medium failure the previous credential stays current in memory
    /// and on the medium.
    pub async fn save_tokens(
        &self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user: UserSnapshot,
    ) -> Result<(), CredentialsError> {
        self.save_credentials(Credentials::new(access_token, refresh_token, user))
            .await
    }

    /// Persist `credentials` and make them current.
    pub async fn save_credentials(&self, credentials: Credentials) -> Result<(), CredentialsError> {
        let _writer = self.write_lock.lock().await;

        if let Err(e) = self.provider.save(&credentials).await {
            tracing::warn!("Failed to persist credentials: {}", e);
            return Err(e);
        }

        self.replace_snapshot(Some(Arc::new(credentials)));
        tracing::debug!("Stored new credentials");
        Ok(())
    }

    /// Remove the credential and notify every listener.
    ///
    /// Listeners fire even when the store was already empty, and even when
    /// the medium fails to delete; the medium error is returned afterwards.
    pub async fn clear_tokens(&self) -> Result<(), CredentialsError> {
        let result = {
            let _writer = self.write_lock.lock().await;
            let result = self.provider.clear().await;
            self.replace_snapshot(None);
            result
        };

        match &result {
            Ok(()) => tracing::info!("Credentials cleared"),
            Err(e) => tracing::warn!("Credentials dropped from memory but not from storage: {}", e),
        }

        self.notifier.notify();
        result
    }

    /// Replace only the user snapshot of the current credential.
    pub async fn update_stored_user(&self, user: UserSnapshot) -> Result<(), CredentialsError> {
        let _writer = self.write_lock.lock().await;

        let Some(current) = self.current() else {
            return Err(CredentialsError::NotFound);
        };
        let updated = Credentials {
            user,
            ..(*current).clone()
        };

        self.provider.save(&updated).await?;
        self.replace_snapshot(Some(Arc::new(updated)));
        Ok(())
    }

    /// Register a callback for sign-out, replacing any with the same id.
    pub fn on_tokens_cleared<F>(&self, id: impl Into<ListenerId>, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier.subscribe(id, callback);
    }

    pub fn remove_tokens_cleared_callback(&self, id: &str) {
        self.notifier.unsubscribe(id);
    }

    pub fn notifier(&self) -> &SessionNotifier {
        &self.notifier
    }
}
