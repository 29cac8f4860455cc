//! Logging infrastructure for cubeatlas.
//!
//! Provides structured logging to stderr, configurable via the
//! `RUST_LOG` environment variable. Results and summaries go to stdout,
//! so log lines never interleave with them.

use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Initialize the global logging subscriber.
///
/// Defaults to `info` level (`debug` when `debug` is set); `RUST_LOG`
/// overrides either.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(debug: bool) -> Result<(), TryInitError> {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
}
