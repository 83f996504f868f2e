//! The rebuild plan: branches, stages, and the snapshot list.
//!
//! The replay engine is payload-free: everything branch-specific
//! (names, base refs, deletions, writes, commit messages) lives in a
//! TOML plan document parsed here. [`RebuildPlan::builtin`] returns
//! the embedded default plan; [`RebuildPlan::load`] reads one from
//! disk. Both validate the progression invariants before the plan
//! reaches the sequencer.

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};

use serde::Deserialize;

/// The embedded default plan: the six-branch progression this tool
/// was originally written to maintain.
const BUILTIN_PLAN: &str = include_str!("builtin_plan.toml");

// ---------------------------------------------------------------------------
// Plan model
// ---------------------------------------------------------------------------

/// A full rebuild plan.
///
/// Branches are listed in strict progression order: each branch is
/// hard-reset to the one before it (the first to a fixed ref), so the
/// sequencer may only ever process them front to back.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RebuildPlan {
    /// Advanced-file preservation, captured before any reset.
    pub snapshot: Option<SnapshotSpec>,

    /// Branch to check out once the run completes (default: the first
    /// branch in the progression).
    pub final_checkout: Option<String>,

    /// The progression, in rebuild order.
    pub branches: Vec<BranchSpec>,
}

/// Which branch holds the full feature set, and which paths to carry
/// over from it into the terminal branch.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotSpec {
    /// Branch holding the union of every advanced feature file.
    pub source: String,
    /// Paths to capture. Absent paths are skipped and reported.
    pub paths: Vec<String>,
}

/// One branch's stage: where it resets to and what its tree gains.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchSpec {
    pub name: String,

    /// Ref this branch is hard-reset to before the stage is applied.
    /// The first branch resets to a fixed ref; every later branch must
    /// reset to the branch immediately before it.
    pub base: String,

    /// Message for the single commit this stage produces.
    pub message: String,

    /// Directories deleted (recursively) after the reset.
    #[serde(default)]
    pub remove_dirs: Vec<String>,

    /// Files deleted after the reset.
    #[serde(default)]
    pub remove_files: Vec<String>,

    /// Files written after the deletions.
    #[serde(default)]
    pub writes: Vec<FileEntry>,

    /// Replay the captured snapshot into this branch before the
    /// commit. Only the last branch may set this.
    #[serde(default)]
    pub restore_snapshot: bool,
}

/// A (relative path, content) pair. Its only identity is its path
/// within the branch's working tree at the moment of commit.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Error loading or validating a plan document.
#[derive(Debug)]
pub struct PlanError {
    /// The path that was being loaded (if any).
    pub path: Option<std::path::PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl PlanError {
    fn msg(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "plan error: {}", self.message)
        }
    }
}

impl std::error::Error for PlanError {}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl RebuildPlan {
    /// The embedded default plan.
    ///
    /// # Errors
    /// Returns `PlanError` only if the embedded document is broken;
    /// covered by tests, so in practice this does not fail.
    pub fn builtin() -> Result<Self, PlanError> {
        Self::parse(BUILTIN_PLAN)
    }

    /// Load and validate a plan from a TOML file. Unlike repository
    /// config files, a plan has no sensible empty default, so a
    /// missing file is an error.
    ///
    /// # Errors
    /// Returns `PlanError` on read failure, invalid TOML, or a
    /// validation violation.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let contents = std::fs::read_to_string(path).map_err(|e| PlanError {
            path: Some(path.to_owned()),
            message: format!("could not read file: {e}"),
        })?;
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse and validate a plan from a TOML string.
    ///
    /// # Errors
    /// Returns `PlanError` on invalid TOML, unknown fields, or a
    /// validation violation.
    pub fn parse(toml_str: &str) -> Result<Self, PlanError> {
        let plan: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                // Calculate line number from byte offset.
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            PlanError {
                path: None,
                message,
            }
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// The branch to check out once the run completes.
    #[must_use]
    pub fn final_branch(&self) -> &str {
        self.final_checkout
            .as_deref()
            .or_else(|| self.branches.first().map(|b| b.name.as_str()))
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<(), PlanError> {
        if self.branches.is_empty() {
            return Err(PlanError::msg("plan has no branches"));
        }

        let last = self.branches.len() - 1;
        let mut seen = HashSet::new();
        for (i, branch) in self.branches.iter().enumerate() {
            if branch.name.is_empty() {
                return Err(PlanError::msg(format!("branch {i} has an empty name")));
            }
            if !seen.insert(branch.name.as_str()) {
                return Err(PlanError::msg(format!(
                    "duplicate branch name '{}'",
                    branch.name
                )));
            }
            if branch.base.is_empty() {
                return Err(PlanError::msg(format!(
                    "branch '{}' has an empty base ref",
                    branch.name
                )));
            }
            // The progression invariant: rebuilding branch N requires
            // branch N-1's committed state as the reset target.
            if i > 0 {
                let prev = self.branches[i - 1].name.as_str();
                if branch.base != prev {
                    return Err(PlanError::msg(format!(
                        "branch '{}' must reset to the preceding branch '{prev}' (found base '{}')",
                        branch.name, branch.base
                    )));
                }
            }
            if branch.restore_snapshot {
                if self.snapshot.is_none() {
                    return Err(PlanError::msg(format!(
                        "branch '{}' restores the snapshot but the plan has no [snapshot] section",
                        branch.name
                    )));
                }
                if i != last {
                    return Err(PlanError::msg(format!(
                        "only the last branch may restore the snapshot (found '{}' at position {i})",
                        branch.name
                    )));
                }
            }
            for dir in &branch.remove_dirs {
                check_rel_path(dir)
                    .map_err(|m| PlanError::msg(format!("branch '{}': {m}", branch.name)))?;
            }
            for file in &branch.remove_files {
                check_rel_path(file)
                    .map_err(|m| PlanError::msg(format!("branch '{}': {m}", branch.name)))?;
            }
            for entry in &branch.writes {
                check_rel_path(&entry.path)
                    .map_err(|m| PlanError::msg(format!("branch '{}': {m}", branch.name)))?;
            }
        }

        if let Some(snapshot) = &self.snapshot {
            if snapshot.source.is_empty() {
                return Err(PlanError::msg("snapshot source branch is empty"));
            }
            for path in &snapshot.paths {
                check_rel_path(path).map_err(|m| PlanError::msg(format!("snapshot: {m}")))?;
            }
        }

        if let Some(final_checkout) = &self.final_checkout
            && !self.branches.iter().any(|b| &b.name == final_checkout)
        {
            return Err(PlanError::msg(format!(
                "final_checkout '{final_checkout}' is not a plan branch"
            )));
        }

        Ok(())
    }
}

/// Plan paths are relative to the repository root; traversal out of
/// the root is rejected.
fn check_rel_path(raw: &str) -> Result<(), String> {
    if raw.is_empty() {
        return Err("path is empty".to_owned());
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        return Err(format!(
            "path '{raw}' is absolute; plan paths are relative to the repository root"
        ));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(format!("path '{raw}' contains '..'"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
