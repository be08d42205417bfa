//! drupalkit CLI entry point.
//!
//! Parses the command line, installs the tracing subscriber and runs the
//! selected subcommand. Errors are shown through
//! [`user_friendly_error`](drupalkit::core::user_friendly_error) and exit with
//! status 1.

use anyhow::Result;
use clap::Parser;
use drupalkit::cli::{self, CliConfig};
use drupalkit::core::user_friendly_error;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &CliConfig) {
    let filter = match &config.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    // Logs go to stderr so JSON on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    init_logging(&cli.build_config());

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
