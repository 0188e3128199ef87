//! Credentials provider trait abstraction.
//!
//! The durable storage medium behind the
//! [`CredentialStore`](crate::session::CredentialStore). Implementations only
//! need whole-record load, replace and delete.

use async_trait::async_trait;

use crate::auth::Credentials;

/// Credentials operation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialsError {
    /// Failed to load credentials
    LoadFailed(String),
    /// Failed to save credentials
    SaveFailed(String),
    /// Failed to clear credentials
    ClearFailed(String),
    /// Credentials not found
    NotFound,
    /// Serialization/deserialization error
    Serialization(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialsError::LoadFailed(msg) => write!(f, "Failed to load credentials: {}", msg),
            CredentialsError::SaveFailed(msg) => write!(f, "Failed to save credentials: {}", msg),
            CredentialsError::ClearFailed(msg) => {
                write!(f, "Failed to clear credentials: {}", msg)
            }
            CredentialsError::NotFound => write!(f, "Credentials not found"),
            CredentialsError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            CredentialsError::Other(msg) => write!(f, "Credentials error: {}", msg),
        }
    }
}

impl std::error::Error for CredentialsError {}

/// Trait for credentials storage and retrieval.
///
/// `save` must replace the stored record as a unit: if it fails, the
/// previously stored credentials remain readable.
///
/// # Example
///
/// ```ignore
/// use session_link::traits::{CredentialsError, CredentialsProvider};
///
/// async fn signed_in<P: CredentialsProvider>(provider: &P) -> Result<bool, CredentialsError> {
///     Ok(provider.load().await?.is_some())
/// }
/// ```
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Load credentials from storage.
    ///
    /// # Returns
    /// - `Ok(Some(credentials))` if credentials exist and were loaded successfully
    /// - `Ok(None)` if no credentials are stored
    /// - `Err(error)` if loading failed
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError>;

    /// Replace the stored credentials.
    async fn save(&self, creds: &Credentials) -> Result<(), CredentialsError>;

    /// Remove stored credentials. Succeeds when nothing was stored.
    async fn clear(&self) -> Result<(), CredentialsError>;
}
