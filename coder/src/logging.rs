//! Development-time tracing for the runner.
//!
//! Tracing goes to stderr and is not persisted. The product artifacts of a
//! mission (plan, registry, execution log, transcripts) are written under the
//! workspace log directory regardless of `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to `coder=info`. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=coder=debug coder --request "add a CLI" --workspace ./ws
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coder=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
