//! Logging initialization
//!
//! Log events go to stderr so stdout stays clean for YAML and JSON output.
//! `RUST_LOG` overrides the level picked from `--verbose`.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber; later calls are no-ops
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
