//! commerce-migrate - apply or revert the database schema
//!
//! Takes exactly one argument:
//! - `-up` applies every pending migration
//! - `-down` reverts every applied migration
//!
//! Anything else, `--help` included, is a usage error. The argument is
//! validated before configuration is read or a connection is attempted.
//! Logging follows `RUST_LOG`, or `LOG_DEBUG=true` for debug output.

use anyhow::{bail, Context, Result};
use clap::Parser;
use commerce_server::db::migrations::{self, Direction};
use commerce_server::logging::{self, LogWriter, TracingConfig};
use commerce_server::{AppConfig, DatabaseBackend};
use tracing::info;

const UP: &str = "-up";
const DOWN: &str = "-down";

#[derive(Parser, Debug)]
#[command(
    name = "commerce-migrate",
    about = "Apply or revert the commerce database schema",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// `-up` to apply pending migrations, `-down` to revert all of them
    #[arg(
        value_name = "DIRECTION",
        allow_hyphen_values = true,
        value_parser = [UP, DOWN],
    )]
    direction: String,
}

impl Cli {
    fn direction(&self) -> Result<Direction> {
        match self.direction.as_str() {
            UP => Ok(Direction::Up),
            DOWN => Ok(Direction::Down),
            other => bail!("invalid arg {other:?}: allowed arg is either {UP} or {DOWN}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let direction = cli.direction()?;

    let config = AppConfig::from_env().context("failed to load configuration")?;
    logging::init(&TracingConfig {
        debug: config.log_debug,
        writer: LogWriter::Stderr,
    })?;

    if config.database_backend != DatabaseBackend::Postgres {
        bail!("migrations only apply to the postgres backend");
    }

    migrations::run(&config.database, direction)
        .await
        .with_context(|| format!("{} failed", cli.direction))?;

    info!(direction = ?direction, "migrations complete");
    Ok(())
}
