//! Concrete implementations of trait abstractions.
//!
//! These adapters implement the traits defined in `crate::traits` against
//! real infrastructure, so the session layer can be tested with the mocks
//! and run with these.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileCredentialsProvider`] - File-based credentials storage
//! - [`GraphQlHttpTransport`] - Queries and mutations over HTTP POST
//! - [`GraphQlSseTransport`] - Subscriptions over Server-Sent Events
//! - [`BrowserSignIn`] - Opens the sign-in page in the system browser
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for all adapters:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::InMemoryCredentials`] - In-memory credential storage
//! - [`mock::MockTransport`] - Scripted GraphQL replies
//! - [`mock::MockRenewalExecutor`] - Scripted renewals
//! - [`mock::RecordingSignIn`] - Redirect counter

pub mod browser_sign_in;
pub mod file_credentials;
pub mod graphql_http;
pub mod graphql_sse;
pub mod mock;
pub mod reqwest_http;

pub use browser_sign_in::BrowserSignIn;
pub use file_credentials::FileCredentialsProvider;
pub use graphql_http::GraphQlHttpTransport;
pub use graphql_sse::GraphQlSseTransport;
pub use mock::{InMemoryCredentials, MockHttpClient, MockRenewalExecutor, MockTransport};
pub use reqwest_http::ReqwestHttpClient;
