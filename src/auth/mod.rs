//! Credentials and the renewal endpoint.
//!
//! - [`Credentials`], [`UserSnapshot`], [`TokenGrant`] - the credential model
//! - [`CredentialsManager`] - JSON file storage
//! - [`RenewalApiClient`] - refresh-token exchange over an isolated HTTP client

pub mod credentials;
pub mod renewal_api;

pub use credentials::{Credentials, CredentialsManager, TokenGrant, UserSnapshot};
pub use renewal_api::RenewalApiClient;
