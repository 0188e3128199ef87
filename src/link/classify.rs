//! Recognizing authentication failures.

use crate::error::LinkError;

/// Message fragments (matched case-insensitively) that mark an
/// authentication failure.
pub const AUTH_ERROR_PHRASES: &[&str] = &[
    "unauthorized",
    "invalid token",
    "token expired",
    "authentication required",
    "invalid or expired token",
];

/// `extensions.code` some servers use for authentication failures.
pub const UNAUTHENTICATED_CODE: &str = "UNAUTHENTICATED";

pub fn is_auth_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    AUTH_ERROR_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Whether `err` means the access token was not accepted.
///
/// True on a 401 status, on any message containing an auth phrase, or on an
/// `UNAUTHENTICATED` error code. [`LinkError::SessionExpired`] is never an
/// auth failure: it is already the terminal outcome of one.
pub fn is_auth_failure(err: &LinkError) -> bool {
    if err.is_session_expired() {
        return false;
    }

    err.status() == Some(401)
        || err.messages().into_iter().any(is_auth_message)
        || err
            .graphql_errors()
            .iter()
            .any(|e| e.code() == Some(UNAUTHENTICATED_CODE))
}
