//! Logging setup for the pipeline binaries.

use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber that logs to stderr.
///
/// The level defaults to `info` and can be overridden with `RUST_LOG`.
/// Logs go to stderr so the colorized report on stdout stays readable.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
