//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (POST, streaming POST)
//! - [`CredentialsProvider`] - Durable credentials storage
//! - [`Transport`] - Dispatch of prepared GraphQL requests
//! - [`RenewalExecutor`] - Refresh-token exchange
//! - [`SignInRedirect`] - Sign-in navigation side effect

pub mod credentials;
pub mod http;
pub mod renewal;
pub mod sign_in;
pub mod transport;

pub use credentials::{CredentialsError, CredentialsProvider};
pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
pub use renewal::RenewalExecutor;
pub use sign_in::SignInRedirect;
pub use transport::Transport;
