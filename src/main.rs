//! hockeystats - NHL statistics from the command line
//!
//! Fetches NHL statistics, caching each request under the cache directory, and
//! prints the reshaped result as pretty JSON. Logs go to stderr.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hockeystats::cli::{Cli, ClientConfig};

/// Sets up logging to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ClientConfig::from_cli(&cli)?;
    let client = config.build_client();

    let output = cli.command.execute(&client, config.fetch).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
