//! Single-branch rebuild: reset to base, apply the stage, commit.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::RestageError;
use crate::fsops;
use crate::git::Git;
use crate::plan::BranchSpec;
use crate::snapshot::Snapshot;

/// What the commit step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// The stage produced one commit.
    Committed,
    /// The stage left the tree byte-identical to its base: no commit
    /// was created and the branch points at the base ref. Downstream
    /// branches reset onto it safely, so this is not fatal anywhere
    /// in the chain.
    NothingToCommit,
}

/// Rebuild one branch: checkout, hard-reset to its base, apply the
/// stage's deletions and writes (plus the snapshot, on the terminal
/// branch), stage everything, and commit once.
///
/// The branch must already exist; creating branches is out of scope.
/// Deletions run before writes so a stage may clear a directory and
/// re-populate part of it.
///
/// # Errors
/// Fail-fast: the first strict git or filesystem failure aborts,
/// leaving the repository exactly where the step halted.
pub fn rebuild(
    git: &Git,
    spec: &BranchSpec,
    snapshot: Option<&Snapshot>,
) -> Result<Outcome, RestageError> {
    info!(branch = %spec.name, base = %spec.base, "rebuilding");

    git.checkout(&spec.name)?;
    git.reset_hard(&spec.base)?;

    for dir in &spec.remove_dirs {
        fsops::remove_dir(git.root(), dir).map_err(|e| RestageError::io(dir, e))?;
    }
    for file in &spec.remove_files {
        fsops::remove_file(git.root(), file).map_err(|e| RestageError::io(file, e))?;
    }
    for entry in &spec.writes {
        fsops::write_file(git.root(), &entry.path, &entry.content)
            .map_err(|e| RestageError::io(&entry.path, e))?;
    }
    if spec.restore_snapshot
        && let Some(snapshot) = snapshot
    {
        snapshot.restore(git.root())?;
    }

    git.add_all()?;
    if git.is_clean()? {
        warn!(branch = %spec.name, "stage left the tree identical to its base; skipping commit");
        return Ok(Outcome::NothingToCommit);
    }
    git.commit(&spec.message)?;

    info!(branch = %spec.name, "committed");
    Ok(Outcome::Committed)
}
