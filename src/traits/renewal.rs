//! Renewal executor trait abstraction.

use async_trait::async_trait;

use crate::auth::TokenGrant;
use crate::error::RenewalError;

/// Exchanges a refresh token for a new credential.
///
/// Implementations must not route their call through the link chain: a
/// failing renewal would otherwise trigger another renewal.
#[async_trait]
pub trait RenewalExecutor: Send + Sync {
    /// Perform the exchange.
    async fn renew(&self, refresh_token: &str) -> Result<TokenGrant, RenewalError>;
}
