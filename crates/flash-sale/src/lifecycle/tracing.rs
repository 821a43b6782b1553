//! Subscriber setup for the binary and for tests that want to see logs.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` selects levels and defaults to `info`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_target(false) // Spans and fields say enough; module paths only add noise
        .compact()
        .init();
}

/// Like [`setup_tracing`], but safe to call from every test.
pub fn try_setup_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_test_writer()
        .compact()
        .try_init();
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
