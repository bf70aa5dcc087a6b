//! commerce-server binary
//!
//! Loads configuration, installs tracing, builds the service graph and
//! serves HTTP until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;

use commerce_server::logging::{self, LogWriter, TracingConfig};
use commerce_server::{app, http, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "commerce-server", version, about = "E-commerce backend HTTP server")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;

    logging::init(&TracingConfig {
        debug: cli.debug || config.log_debug,
        writer: LogWriter::Stdout,
    })?;

    let state = app::build(&config).await?;

    http::run_server(state, config.server)
        .await
        .context("server error")?;

    Ok(())
}
