//! Common test utilities for integration tests.
//!
//! Builds sessions over the mock adapters so tests can script the server
//! and the renewal endpoint and then inspect what the pipeline did.
//!
//! # Example
//!
//! ```ignore
//! use common::TestSession;
//!
//! let t = TestSession::signed_in().await;
//! t.transport.push_reply("Balance", MockReply::graphql_error("Token expired"));
//! ```

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use session_link::adapters::mock::{
    InMemoryCredentials, MockRenewalExecutor, MockTransport, RecordingSignIn,
};
use session_link::auth::{Credentials, UserSnapshot};
use session_link::config::SessionConfig;
use session_link::operation::Operation;
use session_link::session::{CredentialStore, Session};

/// The signed-in user used throughout the tests.
pub fn test_user() -> UserSnapshot {
    UserSnapshot::new(serde_json::json!({"id": "u1", "username": "ada"}))
}

/// Credential pair {T1, R1} for [`test_user`].
pub fn test_credentials() -> Credentials {
    Credentials::new("T1", "R1", test_user())
}

/// A query with an operation name, so mock replies can be scripted by name.
pub fn named_query(name: &str) -> Operation {
    Operation::new(format!("query {} {{ balance }}", name)).with_name(name)
}

/// Counts how often the store's listeners fire.
pub fn count_clears(store: &CredentialStore, id: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    store.on_tokens_cleared(id, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    });
    count
}

/// A session over mocks, with handles to every mock.
pub struct TestSession {
    pub session: Session,
    pub provider: InMemoryCredentials,
    pub transport: MockTransport,
    pub stream_transport: MockTransport,
    pub executor: MockRenewalExecutor,
    pub sign_in: RecordingSignIn,
}

impl TestSession {
    /// Signed in as {T1, R1}; renewal grants {T2, R2}.
    pub async fn signed_in() -> Self {
        Self::build(
            Some(test_credentials()),
            MockRenewalExecutor::granting("T2", "R2"),
            SessionConfig::default(),
        )
        .await
    }

    pub async fn signed_in_with(executor: MockRenewalExecutor) -> Self {
        Self::build(Some(test_credentials()), executor, SessionConfig::default()).await
    }

    pub async fn build(
        credentials: Option<Credentials>,
        executor: MockRenewalExecutor,
        config: SessionConfig,
    ) -> Self {
        let provider = InMemoryCredentials::new();
        provider.set_credentials(credentials);
        let transport = MockTransport::new();
        let stream_transport = MockTransport::new();
        let sign_in = RecordingSignIn::new();

        let session = Session::builder(config)
            .with_credentials_provider(Arc::new(provider.clone()))
            .with_transport(Arc::new(transport.clone()))
            .with_stream_transport(Arc::new(stream_transport.clone()))
            .with_renewal_executor(Arc::new(executor.clone()))
            .with_sign_in(Arc::new(sign_in.clone()))
            .build()
            .await
            .expect("session over mocks always builds");

        Self {
            session,
            provider,
            transport,
            stream_transport,
            executor,
            sign_in,
        }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        self.session.store()
    }
}

/// Poll `condition` until it holds, failing the test after a second.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
