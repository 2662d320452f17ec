//! Tracing subscriber setup
//!
//! Log output goes to stderr so that the JSON report on stdout stays clean.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// The filter comes from `RUST_LOG` (default `info`), e.g.
/// `RUST_LOG=stock_ledger=debug`.
///
/// ```no_run
/// stock_ledger::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Debug-level subscriber captured by the test harness; safe to call repeatedly
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
