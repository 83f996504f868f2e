//! The orchestration state machine.
//!
//! Strict linear order: best-effort stash cleanup, snapshot capture
//! (before any destructive reset), every branch in plan order, then
//! the final checkout. On failure the machine halts in place: no
//! rollback, no retry; the repository is left mid-sequence and the
//! halting phase is logged. Re-running from the start is the recovery
//! path: every stage is a hard reset, so branch content converges
//! even though commit hashes differ between runs.

use std::fmt;

use serde::Serialize;
use tracing::{error, info};

use crate::error::RestageError;
use crate::git::Git;
use crate::plan::RebuildPlan;
use crate::rebuild::{self, Outcome};
use crate::snapshot::Snapshot;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a run currently stands (or where it halted).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Start,
    CaptureSnapshot,
    Rebuild(String),
    FinalCheckout,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::CaptureSnapshot => write!(f, "capture-snapshot"),
            Self::Rebuild(branch) => write!(f, "rebuild {branch}"),
            Self::FinalCheckout => write!(f, "final-checkout"),
            Self::Done => write!(f, "done"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Outcome of one branch within a full run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BranchReport {
    pub branch: String,
    pub base: String,
    pub outcome: Outcome,
}

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub branches: Vec<BranchReport>,
    /// Files captured from the snapshot source.
    pub snapshot_captured: usize,
    /// Listed snapshot paths absent on the source branch at capture
    /// time; restored files the terminal branch will not have.
    pub snapshot_missing: Vec<String>,
    /// Branch checked out when the run finished.
    pub final_branch: String,
}

// ---------------------------------------------------------------------------
// The sequencer
// ---------------------------------------------------------------------------

/// Run the whole orchestration against a validated plan.
///
/// # Errors
/// The first strict failure halts the run and is returned as-is; the
/// halting phase is logged at ERROR. The repository is left wherever
/// the sequence stood.
pub fn run(git: &Git, plan: &RebuildPlan) -> Result<RunReport, RestageError> {
    // Leftover stash from an interrupted run is the only state worth
    // clearing up front; its absence is fine.
    let mut phase = Phase::Start;
    halted(&phase, git.drop_stash().map_err(Into::into))?;

    // Capture before the first reset destroys the source of truth.
    let snapshot = match &plan.snapshot {
        Some(spec) => {
            phase = Phase::CaptureSnapshot;
            Some(halted(&phase, Snapshot::capture(git, spec))?)
        }
        None => None,
    };

    let mut branches = Vec::with_capacity(plan.branches.len());
    for spec in &plan.branches {
        phase = Phase::Rebuild(spec.name.clone());
        let outcome = halted(&phase, rebuild::rebuild(git, spec, snapshot.as_ref()))?;
        branches.push(BranchReport {
            branch: spec.name.clone(),
            base: spec.base.clone(),
            outcome,
        });
    }

    phase = Phase::FinalCheckout;
    let final_branch = plan.final_branch();
    halted(&phase, git.checkout(final_branch).map_err(Into::into))?;

    info!(phase = %Phase::Done, branches = branches.len(), "all branches rebuilt");
    Ok(RunReport {
        branches,
        snapshot_captured: snapshot.as_ref().map_or(0, Snapshot::len),
        snapshot_missing: snapshot
            .as_ref()
            .map_or_else(Vec::new, |s| s.missing().to_vec()),
        final_branch: final_branch.to_owned(),
    })
}

/// Log the halting phase before propagating a failure.
fn halted<T>(phase: &Phase, result: Result<T, RestageError>) -> Result<T, RestageError> {
    if let Err(e) = &result {
        error!(phase = %phase, error = %e, "run halted; repository left mid-sequence");
    }
    result
}
