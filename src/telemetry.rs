//! Telemetry initialization.
//!
//! Plain-text tracing to stderr, filtered by `RUST_LOG` (default:
//! `restage=info`). The engine narrates progress through tracing
//! events; stdout is reserved for command output so `--format json`
//! stays machine-parseable.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("restage=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}
