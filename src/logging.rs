//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber. `RUST_LOG` wins when set; otherwise `info`,
/// or `debug` when `verbose`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
