//! File-based credentials provider adapter.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::auth::credentials::{Credentials, CredentialsManager};
use crate::traits::{CredentialsError, CredentialsProvider};

/// File-based credentials provider.
///
/// Wraps [`CredentialsManager`] and implements [`CredentialsProvider`].
/// Credentials live in `~/.session-link/credentials.json` unless a path is
/// given.
///
/// # Example
///
/// ```ignore
/// use session_link::adapters::FileCredentialsProvider;
/// use session_link::traits::CredentialsProvider;
///
/// let provider = FileCredentialsProvider::new()?;
/// if let Some(creds) = provider.load().await? {
///     println!("Signed in as {:?}", creds.user.display_name());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialsProvider {
    manager: CredentialsManager,
}

impl FileCredentialsProvider {
    /// Create a provider for the default location.
    ///
    /// # Returns
    /// The provider, or an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, CredentialsError> {
        CredentialsManager::new()
            .map(|manager| Self { manager })
            .ok_or_else(|| {
                CredentialsError::Other("Failed to determine home directory".to_string())
            })
    }

    /// Create a provider for an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            manager: CredentialsManager::with_path(path),
        }
    }

    /// Get a reference to the underlying credentials manager.
    pub fn manager(&self) -> &CredentialsManager {
        &self.manager
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &PathBuf {
        self.manager.credentials_path()
    }
}

#[async_trait]
impl CredentialsProvider for FileCredentialsProvider {
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        self.manager.load()
    }

    async fn save(&self, creds: &Credentials) -> Result<(), CredentialsError> {
        self.manager.save(creds)
    }

    async fn clear(&self) -> Result<(), CredentialsError> {
        self.manager.clear()
    }
}
