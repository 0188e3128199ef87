//! CLI module for session-link.
//!
//! Parses arguments and runs a single operation through a [`Session`],
//! printing the result as JSON.
//!
//! ```ignore
//! use session_link::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args()) {
//!     CliCommand::Run(args) => run_operation(&session, &args, &mut std::io::stdout()).await?,
//!     _ => {}
//! }
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, CliCommand, RunArgs, USAGE};
pub use version::{handle_version_command, VERSION};

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use futures::StreamExt;
use std::io::Write;

use crate::error::{AuthError, LinkError};
use crate::operation::{Operation, Reply};
use crate::session::Session;

/// Build the operation described by `args`.
pub fn build_operation(args: &RunArgs) -> Result<Operation> {
    let mut operation = Operation::new(args.query.clone());

    if let Some(raw) = &args.variables {
        let variables: serde_json::Value =
            serde_json::from_str(raw).wrap_err("--variables is not valid JSON")?;
        if !variables.is_object() {
            return Err(eyre!("--variables must be a JSON object"));
        }
        operation = operation.with_variables(variables);
    }
    if let Some(name) = &args.operation_name {
        operation = operation.with_name(name.clone());
    }

    Ok(operation)
}

/// Turn a pipeline failure into the report shown to the user.
///
/// Failures that need a new sign-in lead with the user-facing message;
/// the rest name their category and whether retrying may help.
pub fn failure_report(label: &str, err: &LinkError) -> color_eyre::Report {
    if let Some(auth) = err.auth_error().filter(AuthError::requires_reauth) {
        return eyre!("{} failed: {}", label, err).wrap_err(auth.user_message());
    }

    let category = err.category();
    if category.is_retryable() {
        eyre!("{} failed ({}, retryable): {}", label, category, err)
    } else {
        eyre!("{} failed ({}): {}", label, category, err)
    }
}

/// Run the operation and write its JSON result to `out`.
///
/// Queries and mutations write one pretty-printed response; subscriptions
/// write one compact line per event until the stream ends.
pub async fn run_operation<W: Write>(session: &Session, args: &RunArgs, out: &mut W) -> Result<()> {
    let operation = build_operation(args)?;
    let label = operation.label();

    let reply = session
        .execute(operation)
        .await
        .map_err(|e| failure_report(&label, &e))?;

    match reply {
        Reply::Unary(response) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
        }
        Reply::Stream(mut events) => {
            while let Some(event) = events.next().await {
                let event = event.wrap_err_with(|| format!("{} stream failed", label))?;
                writeln!(out, "{}", serde_json::to_string(&event)?)?;
                out.flush()?;
            }
        }
    }

    Ok(())
}
