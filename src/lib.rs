pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

/// Structured logging to stderr, filtered by `RUST_LOG`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,javaguard_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}
