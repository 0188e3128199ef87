//! Mock implementations for testing.
//!
//! This module provides mock implementations of all trait abstractions,
//! enabling unit testing without network dependencies or file system access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses
//! - [`InMemoryCredentials`] - In-memory credential storage
//! - [`MockTransport`] - Transport with per-operation scripted replies
//! - [`MockRenewalExecutor`] - Renewal with scripted results, delays and holds
//! - [`RecordingSignIn`] - Counts sign-in redirects

pub mod credentials;
pub mod http;
pub mod renewal;
pub mod sign_in;
pub mod transport;

pub use credentials::InMemoryCredentials;
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use renewal::{grant, MockRenewalExecutor, RenewalBehavior};
pub use sign_in::RecordingSignIn;
pub use transport::{MockReply, MockTransport};
