//! Authentication-related error types.
//!
//! [`AuthError`] is the presentation-facing view of session problems: what
//! happened, whether the user must sign in again, and a message to show.

use std::fmt;

use super::renewal::RenewalError;

/// Authentication-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Refresh token has expired or is invalid.
    RefreshTokenInvalid { message: String },

    /// Failed to refresh the access token for another reason.
    RefreshFailed { message: String },

    /// The renewal call did not complete in time.
    RefreshTimedOut { seconds: u64 },

    /// Credentials could not be saved.
    CredentialsSaveFailed { message: String },

    /// No credentials available (user not logged in).
    NotAuthenticated,

    /// API returned an authentication error.
    ApiError { status: u16, message: String },

    /// The session could not be renewed and has been cleared.
    SessionExpired { reason: String },
}

impl AuthError {
    /// Check if this error can only be resolved by signing in again.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            AuthError::RefreshTokenInvalid { .. }
                | AuthError::RefreshFailed { .. }
                | AuthError::RefreshTimedOut { .. }
                | AuthError::NotAuthenticated
                | AuthError::ApiError { status: 401, .. }
                | AuthError::SessionExpired { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::RefreshTokenInvalid { .. } => {
                "Your session could not be renewed. Please sign in again.".to_string()
            }
            AuthError::RefreshFailed { .. } | AuthError::RefreshTimedOut { .. } => {
                "Failed to renew your session. Please sign in again.".to_string()
            }
            AuthError::CredentialsSaveFailed { .. } => {
                "Could not save your credentials. Please check file permissions.".to_string()
            }
            AuthError::NotAuthenticated => {
                "You are not signed in. Please sign in to continue.".to_string()
            }
            AuthError::SessionExpired { .. } => {
                "Your session has ended. Please sign in again.".to_string()
            }
            AuthError::ApiError { status, message } => match *status {
                401 => "Your session has expired. Please sign in again.".to_string(),
                403 => "Access denied. You don't have permission for this action.".to_string(),
                _ => format!("Authentication error: {}", message),
            },
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::RefreshTokenInvalid { .. } => "E_AUTH_REFRESH_INV",
            AuthError::RefreshFailed { .. } => "E_AUTH_REFRESH_FAIL",
            AuthError::RefreshTimedOut { .. } => "E_AUTH_REFRESH_TIMEOUT",
            AuthError::CredentialsSaveFailed { .. } => "E_AUTH_CRED_SAVE",
            AuthError::NotAuthenticated => "E_AUTH_NOT_AUTH",
            AuthError::ApiError { .. } => "E_AUTH_API",
            AuthError::SessionExpired { .. } => "E_AUTH_SESSION_EXP",
        }
    }
}

impl From<&RenewalError> for AuthError {
    fn from(err: &RenewalError) -> Self {
        match err {
            RenewalError::MissingRefreshToken => AuthError::NotAuthenticated,
            RenewalError::RefreshTokenRejected(message) => AuthError::RefreshTokenInvalid {
                message: message.clone(),
            },
            RenewalError::TimedOut(duration) => AuthError::RefreshTimedOut {
                seconds: duration.as_secs(),
            },
            RenewalError::Storage(err) => AuthError::CredentialsSaveFailed {
                message: err.to_string(),
            },
            RenewalError::Transient(message) | RenewalError::InvalidResponse(message) => {
                AuthError::RefreshFailed {
                    message: message.clone(),
                }
            }
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::RefreshTokenInvalid { message } => {
                write!(f, "Refresh token invalid: {}", message)
            }
            AuthError::RefreshFailed { message } => {
                write!(f, "Token refresh failed: {}", message)
            }
            AuthError::RefreshTimedOut { seconds } => {
                write!(f, "Token refresh timed out after {}s", seconds)
            }
            AuthError::CredentialsSaveFailed { message } => {
                write!(f, "Failed to save credentials: {}", message)
            }
            AuthError::NotAuthenticated => write!(f, "Not authenticated"),
            AuthError::ApiError { status, message } => {
                write!(f, "Authentication API error ({}): {}", status, message)
            }
            AuthError::SessionExpired { reason } => write!(f, "Session expired: {}", reason),
        }
    }
}

impl std::error::Error for AuthError {}
