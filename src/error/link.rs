//! Errors surfaced by the request pipeline.

use thiserror::Error;

use super::auth::AuthError;
use super::category::ErrorCategory;
use super::renewal::RenewalError;
use crate::link::classify;
use crate::operation::GraphQlError;
use crate::traits::HttpError;

/// Outcome of a failed dispatch as seen by the caller.
///
/// Exposes both the application-level messages ([`LinkError::messages`]) and
/// the transport status ([`LinkError::status`]) so authentication failures
/// can be recognized from either signal.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// The operation ran and the server reported application errors.
    #[error("{}", join_messages(.errors))]
    Graphql {
        errors: Vec<GraphQlError>,
        data: Option<serde_json::Value>,
    },

    /// Transport-level failure, including non-2xx statuses.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Renewal was impossible and the session has been cleared.
    #[error("session expired, sign in again ({reason})")]
    SessionExpired { reason: RenewalError },

    /// The server answered with something that is not a GraphQL response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A subscription stream broke after it was established.
    #[error("stream error: {0}")]
    Stream(String),
}

fn join_messages(errors: &[GraphQlError]) -> String {
    if errors.is_empty() {
        return "GraphQL error".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl LinkError {
    /// Application-level messages carried by this error.
    pub fn messages(&self) -> Vec<&str> {
        match self {
            LinkError::Graphql { errors, .. } => errors.iter().map(|e| e.message.as_str()).collect(),
            LinkError::Http(HttpError::ServerError { message, .. }) => vec![message.as_str()],
            _ => Vec::new(),
        }
    }

    /// Transport status code, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            LinkError::Http(err) => err.status(),
            _ => None,
        }
    }

    /// GraphQL errors, when the failure carried any.
    pub fn graphql_errors(&self) -> &[GraphQlError] {
        match self {
            LinkError::Graphql { errors, .. } => errors,
            _ => &[],
        }
    }

    /// True for the terminal "sign in again" outcome.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, LinkError::SessionExpired { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        if classify::is_auth_failure(self) {
            return ErrorCategory::Auth;
        }
        match self {
            LinkError::SessionExpired {
                reason: RenewalError::Storage(_),
            } => ErrorCategory::Storage,
            LinkError::SessionExpired { .. } => ErrorCategory::Renewal,
            LinkError::Graphql { .. } => ErrorCategory::Application,
            LinkError::Http(err) if err.is_connectivity() => ErrorCategory::Network,
            LinkError::Http(HttpError::ServerError { status, .. }) if *status >= 500 => {
                ErrorCategory::Server
            }
            LinkError::Http(HttpError::InvalidUrl(_)) => ErrorCategory::Configuration,
            LinkError::Http(_) => ErrorCategory::Application,
            LinkError::InvalidResponse(_) => ErrorCategory::Server,
            LinkError::Stream(_) => ErrorCategory::Network,
        }
    }

    /// Presentation view of authentication-related failures.
    pub fn auth_error(&self) -> Option<AuthError> {
        match self {
            LinkError::SessionExpired { reason } => Some(AuthError::SessionExpired {
                reason: reason.to_string(),
            }),
            _ if classify::is_auth_failure(self) => Some(AuthError::ApiError {
                status: self.status().unwrap_or(401),
                message: self.to_string(),
            }),
            _ => None,
        }
    }
}
