use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use session_link::cli::{handle_version_command, parse_args, run_operation, CliCommand, USAGE};
use session_link::config::SessionConfig;
use session_link::session::Session;

fn main() -> Result<()> {
    // Handle flags before any initialization
    let args = match parse_args(std::env::args()) {
        CliCommand::Version => {
            handle_version_command();
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Invalid(message) => {
            eprintln!("Error: {}\n\n{}", message, USAGE);
            std::process::exit(2);
        }
        CliCommand::Run(args) => args,
    };

    color_eyre::install()?;

    // Logs go to stderr so stdout carries only JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("session_link=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SessionConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let session = Session::builder(config).build().await?;
        if !session.store().is_authenticated() {
            tracing::warn!("No stored credentials; sending the request unauthenticated");
        }
        run_operation(&session, &args, &mut std::io::stdout()).await
    })
}
