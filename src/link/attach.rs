//! Attaches the current credential to every outgoing request.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Link, Next};
use crate::error::LinkError;
use crate::operation::{PendingRequest, Reply, AUTHORIZATION, CONTENT_TYPE};
use crate::session::CredentialStore;

/// Sets `Authorization: Bearer <token>` from the store and the JSON content
/// type. The token is read on every call, so a replay after renewal carries
/// the renewed token.
#[derive(Debug, Clone)]
pub struct AuthLink {
    store: Arc<CredentialStore>,
}

impl AuthLink {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Link for AuthLink {
    async fn call(&self, mut request: PendingRequest, next: Next<'_>) -> Result<Reply, LinkError> {
        match self.store.access_token() {
            Some(token) => request.set_bearer(&token),
            None => request.remove_header(AUTHORIZATION),
        }
        request.set_header(CONTENT_TYPE, "application/json");
        next.run(request).await
    }
}
