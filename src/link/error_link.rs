//! Recovers from authentication failures by renewing once and replaying.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Link, Next};
use crate::error::LinkError;
use crate::operation::{PendingRequest, Reply};
use crate::session::{RefreshCoordinator, RenewalOutcome};
use crate::traits::SignInRedirect;

/// Intercepts authentication failures from the rest of the chain.
///
/// - auth failure, no renewal running: renew, then replay the request once
///   with the new token and return the replay's outcome as final
/// - auth failure while a renewal runs: return the original error
/// - renewal failed and the session was cleared: redirect to sign-in and
///   return [`LinkError::SessionExpired`]
/// - renewal failed transiently with credentials kept: return the original
///   error
/// - anything else: return unchanged
pub struct ErrorLink {
    coordinator: Arc<RefreshCoordinator>,
    sign_in: Arc<dyn SignInRedirect>,
}

impl std::fmt::Debug for ErrorLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLink")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl ErrorLink {
    pub fn new(coordinator: Arc<RefreshCoordinator>, sign_in: Arc<dyn SignInRedirect>) -> Self {
        Self {
            coordinator,
            sign_in,
        }
    }
}

#[async_trait]
impl Link for ErrorLink {
    async fn call(&self, request: PendingRequest, next: Next<'_>) -> Result<Reply, LinkError> {
        let mut replay = request.replay();
        let err = match next.run(request).await {
            Ok(reply) => return Ok(reply),
            Err(err) => err,
        };

        if !err.category().is_intercepted() {
            return Err(err);
        }

        let label = replay.operation.label();
        if self.coordinator.is_in_flight() {
            tracing::debug!("{} failed authentication during renewal, not retrying", label);
            return Err(err);
        }

        match self.coordinator.ensure_fresh_credential().await {
            RenewalOutcome::Renewed(token) => {
                tracing::info!("Replaying {} ({}) with renewed token", label, replay.request_id);
                replay.set_bearer(&token);
                next.run(replay).await
            }
            RenewalOutcome::InFlight => {
                tracing::debug!("{} lost the renewal race, not retrying", label);
                Err(err)
            }
            RenewalOutcome::TransientFailure(reason) => {
                tracing::debug!("{} not retried, renewal deferred: {}", label, reason);
                Err(err)
            }
            RenewalOutcome::TerminalFailure(reason) => {
                tracing::info!("Session cannot be renewed, redirecting to sign-in");
                self.sign_in.redirect_to_sign_in();
                Err(LinkError::SessionExpired { reason })
            }
        }
    }
}
