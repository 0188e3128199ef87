//! Command-line argument parsing for the session-link CLI.

/// Arguments for running one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// GraphQL document
    pub query: String,
    /// Variables as a JSON object
    pub variables: Option<String>,
    /// Value sent as `operationName`
    pub operation_name: Option<String>,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Run an operation through the session pipeline
    Run(RunArgs),
    /// Arguments could not be parsed
    Invalid(String),
}

/// Usage text printed for `--help` and on invalid arguments.
pub const USAGE: &str = "\
Usage: session-link [--version] <query> [--variables <json>] [--operation-name <name>]

Runs a GraphQL operation with the stored session, renewing the access token
when the server rejects it. Subscriptions print one JSON line per event.

Environment:
  SESSION_LINK_ENDPOINT                GraphQL endpoint
  SESSION_LINK_RENEWAL_ENDPOINT        refreshToken endpoint (default: endpoint)
  SESSION_LINK_SIGN_IN_URL             page opened when the session ends
  SESSION_LINK_CREDENTIALS             credentials file
  SESSION_LINK_RENEWAL_TIMEOUT_SECS    renewal timeout (default: 30)
  SESSION_LINK_REQUEST_TIMEOUT_SECS    request timeout (default: 60)
  SESSION_LINK_CLEAR_ON_TRANSIENT      sign out on transient renewal failures (default: true)
  RUST_LOG                             log filter (default: session_link=info)";

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use session_link::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["session-link".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut query = None;
    let mut variables = None;
    let mut operation_name = None;

    // Skip the program name
    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--variables" => match args.next() {
                Some(value) => variables = Some(value),
                None => return CliCommand::Invalid("--variables needs a JSON value".to_string()),
            },
            "--operation-name" => match args.next() {
                Some(value) => operation_name = Some(value),
                None => return CliCommand::Invalid("--operation-name needs a value".to_string()),
            },
            flag if flag.starts_with("--") => {
                return CliCommand::Invalid(format!("unknown option {}", flag));
            }
            _ if query.is_some() => {
                return CliCommand::Invalid(format!("unexpected argument {}", arg));
            }
            _ => query = Some(arg),
        }
    }

    match query {
        Some(query) => CliCommand::Run(RunArgs {
            query,
            variables,
            operation_name,
        }),
        None => CliCommand::Help,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliCommand {
        let mut all = vec!["session-link".to_string()];
        all.extend(args.iter().map(|a| a.to_string()));
        parse_args(all.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), CliCommand::Version);
        assert_eq!(parse(&["-V"]), CliCommand::Version);
        assert_eq!(parse(&["{ me }", "--version"]), CliCommand::Version);
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), CliCommand::Help);
    }

    #[test]
    fn test_parse_query_with_variables() {
        assert_eq!(
            parse(&["query($n: Int) { items(first: $n) }", "--variables", "{\"n\": 3}"]),
            CliCommand::Run(RunArgs {
                query: "query($n: Int) { items(first: $n) }".to_string(),
                variables: Some("{\"n\": 3}".to_string()),
                operation_name: None,
            })
        );
    }

    #[test]
    fn test_parse_operation_name() {
        match parse(&["--operation-name", "Me", "query Me { me { id } }"]) {
            CliCommand::Run(args) => assert_eq!(args.operation_name.as_deref(), Some("Me")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(parse(&["--variables"]), CliCommand::Invalid(_)));
        assert!(matches!(parse(&["--unknown"]), CliCommand::Invalid(_)));
        assert!(matches!(parse(&["{ a }", "{ b }"]), CliCommand::Invalid(_)));
    }
}
