//! Renewal failure reasons.

use std::time::Duration;
use thiserror::Error;

use crate::traits::CredentialsError;

/// Why a credential renewal did not produce a usable credential.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenewalError {
    /// No refresh token was stored when renewal started.
    #[error("no refresh token is stored")]
    MissingRefreshToken,

    /// The server rejected the refresh token as invalid, expired or revoked.
    #[error("refresh token rejected: {0}")]
    RefreshTokenRejected(String),

    /// The renewal call failed without proving the token invalid
    /// (unreachable endpoint, 5xx, unexpected GraphQL error).
    #[error("renewal failed: {0}")]
    Transient(String),

    /// The server answered but the payload was not a credential.
    #[error("invalid renewal response: {0}")]
    InvalidResponse(String),

    /// The renewal call exceeded the configured timeout.
    #[error("renewal timed out after {0:?}")]
    TimedOut(Duration),

    /// The renewed credential could not be persisted.
    #[error("could not store renewed credentials: {0}")]
    Storage(CredentialsError),
}

impl RenewalError {
    /// True when the refresh token itself is known to be unusable.
    pub fn is_terminal(&self) -> bool {
        !self.is_transient()
    }

    /// True when the refresh token was not proven invalid; a later retry
    /// with the same token might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RenewalError::Transient(_) | RenewalError::TimedOut(_))
    }
}
