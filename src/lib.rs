//! restage library crate: re-exports for integration tests.
//!
//! The primary interface is the `restage` binary. This lib.rs exposes
//! the engine modules so integration tests can drive plan parsing,
//! the git plumbing, and the sequencer directly without going through
//! the CLI.

pub mod error;
pub mod fsops;
pub mod git;
pub mod plan;
pub mod rebuild;
pub mod sequence;
pub mod snapshot;

// Private modules only used by the binary; not re-exported.
// doctor, format, run, telemetry
