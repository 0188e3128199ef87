//! Error category classification.
//!
//! Categories mirror how the pipeline treats a failure: authentication
//! failures are intercepted, renewal failures end the session, everything
//! else passes through untouched.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Authentication failure reported by the API.
    /// Recoverable through credential renewal.
    Auth,

    /// Renewal was impossible; the session has been cleared.
    /// Terminal until the user signs in again.
    Renewal,

    /// Connection, DNS or timeout errors.
    Network,

    /// Backend errors (HTTP 5xx, malformed responses).
    Server,

    /// Application-level errors returned by an operation
    /// (validation, business rules).
    Application,

    /// Credential storage medium errors.
    Storage,

    /// Missing or invalid settings.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns true if the pipeline intercepts errors of this category.
    pub fn is_intercepted(&self) -> bool {
        matches!(self, ErrorCategory::Auth)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Auth => "auth",
            ErrorCategory::Renewal => "renewal",
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Application => "application",
            ErrorCategory::Storage => "storage",
            ErrorCategory::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_categories() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Server.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::Renewal.is_retryable());
        assert!(!ErrorCategory::Application.is_retryable());
    }

    #[test]
    fn test_only_auth_is_intercepted() {
        assert!(ErrorCategory::Auth.is_intercepted());
        assert!(!ErrorCategory::Renewal.is_intercepted());
        assert!(!ErrorCategory::Application.is_intercepted());
        assert!(!ErrorCategory::Network.is_intercepted());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(ErrorCategory::Storage.to_string(), "storage");
        assert_eq!(ErrorCategory::Renewal.to_string(), "renewal");
    }
}
