//! Composable request pipeline.
//!
//! A [`LinkChain`] is an ordered list of [`Link`]s that ends in a
//! [`Transport`]. Each link receives the request and a [`Next`] handle for
//! the rest of the chain; it may change the request, forward it, inspect the
//! outcome and, because `Next` is `Copy`, forward a second time.
//!
//! The session uses `ErrorLink -> AuthLink -> TransportSplit`.

pub mod attach;
pub mod classify;
pub mod error_link;
pub mod split;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LinkError;
use crate::operation::{PendingRequest, Reply};
use crate::traits::Transport;

pub use attach::AuthLink;
pub use classify::{is_auth_failure, AUTH_ERROR_PHRASES};
pub use error_link::ErrorLink;
pub use split::{is_subscription, TransportSplit};

/// One stage of the pipeline.
#[async_trait]
pub trait Link: Send + Sync {
    async fn call(&self, request: PendingRequest, next: Next<'_>) -> Result<Reply, LinkError>;
}

/// The remainder of a chain, from some link onward.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    links: &'a [Arc<dyn Link>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    /// Run the rest of the chain on `request`.
    pub async fn run(self, request: PendingRequest) -> Result<Reply, LinkError> {
        match self.links.split_first() {
            Some((link, rest)) => {
                let next = Next {
                    links: rest,
                    transport: self.transport,
                };
                link.call(request, next).await
            }
            None => self.transport.dispatch(&request).await,
        }
    }
}

/// Links in order, terminated by a transport.
#[derive(Clone)]
pub struct LinkChain {
    links: Vec<Arc<dyn Link>>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for LinkChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkChain")
            .field("links", &self.links.len())
            .finish()
    }
}

impl LinkChain {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            links: Vec::new(),
            transport,
        }
    }

    /// Append a link; links run in the order they were added.
    pub fn with_link(mut self, link: impl Link + 'static) -> Self {
        self.links.push(Arc::new(link));
        self
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub async fn execute(&self, request: PendingRequest) -> Result<Reply, LinkError> {
        let next = Next {
            links: &self.links,
            transport: self.transport.as_ref(),
        };
        next.run(request).await
    }
}
