//! Structured logging setup.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "ontomap=info";

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Later calls are ignored.
pub fn init_logging() {
    init_logging_with(DEFAULT_FILTER);
}

/// Like [`init_logging`], with an explicit fallback filter (`-v` flags).
pub fn init_logging_with(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
