//! Transport trait abstraction.
//!
//! A transport takes a fully prepared [`PendingRequest`] (headers already
//! attached) and produces a [`Reply`]. The link chain always terminates in
//! one.

use async_trait::async_trait;

use crate::error::LinkError;
use crate::operation::{PendingRequest, Reply};

/// Dispatches one pending request to the remote API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return its outcome.
    ///
    /// Failures must preserve both the application-level error messages and
    /// the transport status so the error link can classify them.
    async fn dispatch(&self, request: &PendingRequest) -> Result<Reply, LinkError>;
}
