//! Logging init for binaries and tests embedding the scheduler.

use tracing_subscriber::EnvFilter;

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`
/// (default `info,page_batch_queue=debug`).
///
/// Safe to call more than once; later calls leave the existing subscriber alone.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,page_batch_queue=debug"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("page-batch-queue logging initialized");
    }
}
