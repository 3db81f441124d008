//! CLI command definitions, argument parsing, and logging setup.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use patchwise::constants;
use tracing_subscriber::EnvFilter;

/// Install the stderr `tracing` subscriber.
///
/// `PATCHWISE_LOG` takes an `EnvFilter` directive; without it the level is
/// `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(constants::ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
