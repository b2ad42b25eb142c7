use tracing_subscriber::EnvFilter;

use crate::types::LogLevel;

/// Initialize tracing output to stderr.
///
/// RUST_LOG takes precedence over the --log-level flag so targeted filters
/// keep working.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
