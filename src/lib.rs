//! session-link - authenticated GraphQL request pipeline.
//!
//! Every request passes through a link chain that attaches the stored
//! access token, routes subscriptions to a streaming transport and, when the
//! server rejects the token, renews it once (single-flight across all
//! concurrent requests) and replays the request. When renewal is impossible
//! the session is cleared, listeners are notified and the user is sent to
//! sign in.
//!
//! ```ignore
//! use session_link::config::SessionConfig;
//! use session_link::operation::Operation;
//! use session_link::session::Session;
//!
//! let session = Session::builder(SessionConfig::from_env()?).build().await?;
//! let response = session.query(Operation::new("query { me { id } }")).await?;
//! ```

pub mod adapters;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod link;
pub mod operation;
pub mod session;
pub mod sse;
pub mod traits;
