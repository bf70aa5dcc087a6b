//! Tracing setup shared by the workspace binaries
//!
//! Usage:
//!   commerce-server --debug             # Debug logging to console
//!   RUST_LOG=commerce_server=debug ...  # Fine-grained log control
//!
//! Environment variables:
//!   RUST_LOG                            # Log filter (default: info)
//!   LOG_DEBUG                           # Same as --debug

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Where formatted events are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogWriter {
    #[default]
    Stdout,
    /// Keeps stdout clean for command output
    Stderr,
}

impl LogWriter {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            Self::Stdout => BoxMakeWriter::new(std::io::stdout),
            Self::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Tracing configuration options
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConfig {
    /// Debug level unless RUST_LOG is explicitly set
    pub debug: bool,
    pub writer: LogWriter,
}

fn filter(config: &TracingConfig) -> EnvFilter {
    let fallback = if config.debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber.
///
/// A subscriber that is already installed stays in place; the second call
/// is logged and ignored.
pub fn init(config: &TracingConfig) -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .with_target(config.debug) // Show targets in debug mode
        .with_writer(config.writer.make_writer())
        .compact()
        .try_init();

    match installed {
        Ok(()) => Ok(()),
        Err(err) if tracing::dispatcher::has_been_set() => {
            tracing::debug!(error = %err, "tracing already initialised");
            Ok(())
        }
        Err(err) => Err(anyhow!(err)),
    }
}
