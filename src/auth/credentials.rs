//! Credential data model and file storage.
//!
//! Credentials are stored as JSON in `~/.session-link/credentials.json`
//! unless another path is configured. A credential always carries both
//! tokens; "signed out" is the absence of the file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::traits::CredentialsError;

/// The credentials directory name.
const CREDENTIALS_DIR: &str = ".session-link";

/// The credentials file name.
const CREDENTIALS_FILE: &str = "credentials.json";

/// Opaque snapshot of the signed-in user as returned by the API.
///
/// The session layer never interprets it beyond the logging helpers below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSnapshot(pub serde_json::Value);

impl UserSnapshot {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The user's `id` field, if present.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            serde_json::Value::String(id) => Some(id.clone()),
            serde_json::Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// First of `username`, `name` or `email` that is a string.
    pub fn display_name(&self) -> Option<&str> {
        ["username", "name", "email"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(|v| v.as_str()))
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for UserSnapshot {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// An authenticated session: both tokens plus the user they belong to.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: UserSnapshot,
}

impl Credentials {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user: UserSnapshot,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user,
        }
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// A credential as issued by login, registration or renewal.
///
/// Mirrors the camelCase wire shape of the API's token payloads.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: UserSnapshot,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

impl From<TokenGrant> for Credentials {
    fn from(grant: TokenGrant) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            user: grant.user,
        }
    }
}

/// Manages credential storage and retrieval on disk.
#[derive(Debug, Clone)]
pub struct CredentialsManager {
    /// Path to the credentials file.
    credentials_path: PathBuf,
}

impl CredentialsManager {
    /// Create a manager for the default location under the home directory.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        let credentials_path = home.join(CREDENTIALS_DIR).join(CREDENTIALS_FILE);
        Some(Self { credentials_path })
    }

    /// Create a manager for an explicit file path.
    pub fn with_path(credentials_path: PathBuf) -> Self {
        Self { credentials_path }
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &PathBuf {
        &self.credentials_path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .credentials_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.credentials_path.with_file_name(name)
    }

    /// Load credentials from the credentials file.
    ///
    /// A missing file is `Ok(None)`. A file that is not a complete credential
    /// (corrupt JSON, a token missing) is also treated as signed out.
    pub fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        let file = match File::open(&self.credentials_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CredentialsError::LoadFailed(e.to_string())),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(creds) => Ok(Some(creds)),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable credentials file {}: {}",
                    self.credentials_path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Save credentials to the credentials file.
    ///
    /// Writes a sibling temp file and renames it over the target, so a
    /// failed save leaves the previous file untouched. Creates the parent
    /// directory if needed.
    pub fn save(&self, credentials: &Credentials) -> Result<(), CredentialsError> {
        if let Some(parent) = self.credentials_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| CredentialsError::SaveFailed(e.to_string()))?;
            }
        }

        let temp_path = self.temp_path();
        let result = write_file(&temp_path, credentials)
            .and_then(|()| fs::rename(&temp_path, &self.credentials_path).map_err(WriteError::Io));

        result.map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            match e {
                WriteError::Io(e) => CredentialsError::SaveFailed(e.to_string()),
                WriteError::Json(e) => CredentialsError::Serialization(e.to_string()),
            }
        })
    }

    /// Remove the credentials file. A missing file is not an error.
    pub fn clear(&self) -> Result<(), CredentialsError> {
        match fs::remove_file(&self.credentials_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialsError::ClearFailed(e.to_string())),
        }
    }
}

enum WriteError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl From<std::io::Error> for WriteError {
    fn from(e: std::io::Error) -> Self {
        WriteError::Io(e)
    }
}

fn write_file(path: &Path, credentials: &Credentials) -> Result<(), WriteError> {
    let file = create_private(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, credentials).map_err(WriteError::Json)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

#[cfg(unix)]
fn create_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> std::io::Result<File> {
    File::create(path)
}
