//! Single-flight credential renewal.
//!
//! At most one renewal runs at a time. A request that finds a renewal
//! already in flight does not wait for it and does not start another; it
//! gets [`RenewalOutcome::InFlight`] and lets its original error surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::store::CredentialStore;
use crate::error::{AuthError, RenewalError};
use crate::traits::RenewalExecutor;

/// Default bound on one renewal call.
pub const DEFAULT_RENEWAL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenewalState {
    Idle,
    InFlight,
}

/// Result of asking the coordinator for a fresh credential.
#[derive(Debug, Clone, PartialEq)]
pub enum RenewalOutcome {
    /// Renewal succeeded and was stored; carries the new access token.
    Renewed(String),
    /// Another renewal is already running; nothing was done.
    InFlight,
    /// Renewal failed and the session has been cleared.
    TerminalFailure(RenewalError),
    /// Renewal failed transiently and the stored credentials were kept.
    TransientFailure(RenewalError),
}

/// Returns the coordinator to `Idle` when dropped, whatever the exit path.
struct InFlightGuard<'a> {
    state: &'a Mutex<RenewalState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = RenewalState::Idle;
    }
}

/// Owns the renewal state and drives renewals through a [`RenewalExecutor`].
pub struct RefreshCoordinator {
    store: Arc<CredentialStore>,
    executor: Arc<dyn RenewalExecutor>,
    state: Mutex<RenewalState>,
    renewals: AtomicUsize,
    renewal_timeout: Duration,
    clear_on_transient_failure: bool,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.is_in_flight())
            .field("renewals", &self.renewal_count())
            .field("renewal_timeout", &self.renewal_timeout)
            .field("clear_on_transient_failure", &self.clear_on_transient_failure)
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(store: Arc<CredentialStore>, executor: Arc<dyn RenewalExecutor>) -> Self {
        Self {
            store,
            executor,
            state: Mutex::new(RenewalState::Idle),
            renewals: AtomicUsize::new(0),
            renewal_timeout: DEFAULT_RENEWAL_TIMEOUT,
            clear_on_transient_failure: true,
        }
    }

    pub fn with_renewal_timeout(mut self, timeout: Duration) -> Self {
        self.renewal_timeout = timeout;
        self
    }

    /// Whether a transient renewal failure also signs the user out.
    pub fn with_clear_on_transient_failure(mut self, clear: bool) -> Self {
        self.clear_on_transient_failure = clear;
        self
    }

    pub fn is_in_flight(&self) -> bool {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) == RenewalState::InFlight
    }

    /// Number of renewals started since creation.
    pub fn renewal_count(&self) -> usize {
        self.renewals.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == RenewalState::InFlight {
            return None;
        }
        *state = RenewalState::InFlight;
        Some(InFlightGuard { state: &self.state })
    }

    /// Renew the credential unless a renewal is already running.
    pub async fn ensure_fresh_credential(&self) -> RenewalOutcome {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!("Renewal already in flight, not starting another");
            return RenewalOutcome::InFlight;
        };
        self.renewals.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Renewing access token");

        match self.renew().await {
            Ok(access_token) => {
                tracing::info!("Access token renewed");
                RenewalOutcome::Renewed(access_token)
            }
            Err(err) => {
                if self.handle_failure(&err).await {
                    RenewalOutcome::TerminalFailure(err)
                } else {
                    RenewalOutcome::TransientFailure(err)
                }
            }
        }
    }

    async fn renew(&self) -> Result<String, RenewalError> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(RenewalError::MissingRefreshToken)?;

        let grant = tokio::time::timeout(self.renewal_timeout, self.executor.renew(&refresh_token))
            .await
            .map_err(|_| RenewalError::TimedOut(self.renewal_timeout))??;

        let access_token = grant.access_token.clone();
        self.store
            .save_tokens(grant.access_token, grant.refresh_token, grant.user)
            .await
            .map_err(RenewalError::Storage)?;
        Ok(access_token)
    }

    /// Returns true when the session was cleared.
    async fn handle_failure(&self, err: &RenewalError) -> bool {
        if err.is_transient() && !self.clear_on_transient_failure {
            tracing::warn!("Renewal failed, keeping stored credentials: {}", err);
            return false;
        }

        tracing::warn!(
            "Renewal failed ({}), signing out: {}",
            AuthError::from(err).error_code(),
            err
        );
        if let Err(e) = self.store.clear_tokens().await {
            tracing::warn!("Failed to remove stored credentials: {}", e);
        }
        true
    }
}
