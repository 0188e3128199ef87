//! Error handling for the session layer.
//!
//! - [`LinkError`] - what a caller of the pipeline receives
//! - [`RenewalError`] - why a credential renewal failed
//! - [`AuthError`] - user-facing view of session problems
//! - [`ErrorCategory`] - high-level classification for handling decisions
//!
//! | Category | Intercepted by the pipeline | Outcome |
//! |----------|-----------------------------|---------|
//! | Auth | Yes, once per request | renewal + replay, or sign-out |
//! | Renewal | No | terminal, session cleared |
//! | Network / Server / Application | No | returned unchanged |

mod auth;
mod category;
mod link;
mod renewal;

pub use auth::AuthError;
pub use category::ErrorCategory;
pub use link::LinkError;
pub use renewal::RenewalError;

/// Result of a pipeline call.
pub type LinkResult<T> = Result<T, LinkError>;
