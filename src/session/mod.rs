//! Authenticated session: credential store, renewal and the request pipeline.
//!
//! [`Session`] wires the pieces together:
//!
//! ```text
//! execute ─> ErrorLink ─> AuthLink ─> TransportSplit ─┬─> unary transport
//!               │                                     └─> streaming transport
//!               └─> RefreshCoordinator ─> RenewalExecutor
//!                          │
//!                          └─> CredentialStore ─> SessionNotifier
//! ```

pub mod coordinator;
pub mod notifier;
pub mod store;

pub use coordinator::{RefreshCoordinator, RenewalOutcome};
pub use notifier::{ListenerId, SessionNotifier, TokensClearedCallback};
pub use store::CredentialStore;

use std::sync::Arc;
use thiserror::Error;

use crate::adapters::{
    BrowserSignIn, FileCredentialsProvider, GraphQlHttpTransport, GraphQlSseTransport,
    ReqwestHttpClient,
};
use crate::auth::{RenewalApiClient, TokenGrant};
use crate::config::SessionConfig;
use crate::error::LinkError;
use crate::link::{AuthLink, ErrorLink, LinkChain, TransportSplit};
use crate::operation::{Operation, OperationResponse, PendingRequest, Reply};
use crate::traits::{
    CredentialsError, CredentialsProvider, HttpClient, HttpError, RenewalExecutor, SignInRedirect,
    Transport,
};

/// Failure to assemble a [`Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("credentials storage unavailable: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("HTTP client could not be built: {0}")]
    Http(#[from] HttpError),
}

/// Assembles a [`Session`]. Every collaborator not supplied is built from
/// the [`SessionConfig`].
pub struct SessionBuilder {
    config: SessionConfig,
    provider: Option<Arc<dyn CredentialsProvider>>,
    http: Option<Arc<dyn HttpClient>>,
    unary: Option<Arc<dyn Transport>>,
    streaming: Option<Arc<dyn Transport>>,
    executor: Option<Arc<dyn RenewalExecutor>>,
    sign_in: Option<Arc<dyn SignInRedirect>>,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            provider: None,
            http: None,
            unary: None,
            streaming: None,
            executor: None,
            sign_in: None,
        }
    }

    pub fn with_credentials_provider(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// HTTP client for the default GraphQL transports. The default renewal
    /// executor never uses it.
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.unary = Some(transport);
        self
    }

    pub fn with_stream_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.streaming = Some(transport);
        self
    }

    pub fn with_renewal_executor(mut self, executor: Arc<dyn RenewalExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_sign_in(mut self, sign_in: Arc<dyn SignInRedirect>) -> Self {
        self.sign_in = Some(sign_in);
        self
    }

    /// Load the stored credential and build the pipeline.
    pub async fn build(self) -> Result<Session, SessionError> {
        let config = self.config;

        let provider: Arc<dyn CredentialsProvider> = match self.provider {
            Some(provider) => provider,
            None => match &config.credentials_path {
                Some(path) => Arc::new(FileCredentialsProvider::with_path(path.clone())),
                None => Arc::new(FileCredentialsProvider::new()?),
            },
        };

        let unary: Arc<dyn Transport> = match self.unary {
            Some(transport) => transport,
            None => {
                let http: Arc<dyn HttpClient> = match &self.http {
                    Some(http) => Arc::clone(http),
                    None => Arc::new(ReqwestHttpClient::with_timeout(config.request_timeout)?),
                };
                Arc::new(GraphQlHttpTransport::new(config.endpoint.clone(), http))
            }
        };

        // Subscriptions stay open indefinitely, so their client has no
        // overall request timeout.
        let streaming: Arc<dyn Transport> = match self.streaming {
            Some(transport) => transport,
            None => {
                let http: Arc<dyn HttpClient> = match &self.http {
                    Some(http) => Arc::clone(http),
                    None => Arc::new(ReqwestHttpClient::new()),
                };
                Arc::new(GraphQlSseTransport::new(config.endpoint.clone(), http))
            }
        };

        let executor: Arc<dyn RenewalExecutor> = match self.executor {
            Some(executor) => executor,
            None => {
                let http = ReqwestHttpClient::with_timeout(config.request_timeout)?;
                Arc::new(RenewalApiClient::with_http_client(
                    config.renewal_endpoint().to_string(),
                    Arc::new(http),
                ))
            }
        };

        let sign_in: Arc<dyn SignInRedirect> = match self.sign_in {
            Some(sign_in) => sign_in,
            None => Arc::new(BrowserSignIn::new(config.sign_in_url.clone())),
        };

        let store = Arc::new(CredentialStore::load(provider).await);
        let coordinator = Arc::new(
            RefreshCoordinator::new(Arc::clone(&store), executor)
                .with_renewal_timeout(config.renewal_timeout)
                .with_clear_on_transient_failure(config.clear_on_transient_failure),
        );

        let chain = LinkChain::new(Arc::new(TransportSplit::new(unary, streaming)))
            .with_link(ErrorLink::new(Arc::clone(&coordinator), sign_in))
            .with_link(AuthLink::new(Arc::clone(&store)));

        tracing::debug!(
            "Session ready for {} (signed in: {})",
            config.endpoint,
            store.is_authenticated()
        );

        Ok(Session {
            config,
            store,
            coordinator,
            chain,
        })
    }
}

/// Entry point for authenticated GraphQL calls.
pub struct Session {
    config: SessionConfig,
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    chain: LinkChain,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl Session {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Run an operation through the pipeline.
    pub async fn execute(&self, operation: Operation) -> Result<Reply, LinkError> {
        let request = PendingRequest::new(operation);
        tracing::debug!(
            "Executing {} ({})",
            request.operation.label(),
            request.request_id
        );
        self.chain.execute(request).await
    }

    /// Run a query or mutation and return its response.
    pub async fn query(&self, operation: Operation) -> Result<OperationResponse, LinkError> {
        match self.execute(operation).await? {
            Reply::Unary(response) => Ok(response),
            Reply::Stream(_) => Err(LinkError::InvalidResponse(
                "subscription answered with a stream; use execute".to_string(),
            )),
        }
    }

    /// Store the credential issued by login or registration.
    pub async fn sign_in(&self, grant: TokenGrant) -> Result<(), CredentialsError> {
        self.store.save_credentials(grant.into()).await?;
        tracing::info!("Signed in");
        Ok(())
    }

    /// Clear the credential and notify listeners.
    pub async fn sign_out(&self) -> Result<(), CredentialsError> {
        tracing::info!("Signing out");
        self.store.clear_tokens().await
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
