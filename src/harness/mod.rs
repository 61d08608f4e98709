//! Synchronization harness for callback-driven tests.
//!
//! - [`Latch`] - one-shot event with deadline waits
//! - [`Probe`] - per-test completion context built on a latch
//! - [`Fixture`] - running mock server plus deterministic client config

pub mod fixture;
mod latch;
mod probe;

use std::time::Duration;

pub use fixture::Fixture;
pub use latch::Latch;
pub use probe::{Outcome, Probe, ProbeCallback};

/// Deadline for waits in tests that do not pick their own.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Install a test-friendly subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `warn`. Safe to call from every test.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
