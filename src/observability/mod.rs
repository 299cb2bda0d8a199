//! Observability
//!
//! Two outlets: `tracing` events for operators, and `TraceSink` tags for
//! an external instrumentation collaborator. Neither affects results.

mod trace;

pub use trace::{MemoryTraceSink, NoOpTraceSink, TraceSink};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `level` is an `EnvFilter` directive; an invalid one falls back to
/// `info`. Calling this twice leaves the first subscriber in place.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
