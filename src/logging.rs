//! Console tracing for the organizer binary.
//!
//! `RUST_LOG` takes precedence over the configured level:
//!   RUST_LOG=organizer::database=debug organizer tasks

use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `debug` forces the debug level unless
/// `RUST_LOG` is set.
pub fn init_tracing(level: &str, debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| eyre!(err))
}
