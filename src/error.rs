//! Unified error type for the restage engine.
//!
//! Failure taxonomy: a strict git failure is fatal and halts the run
//! where it stood; a best-effort git failure is swallowed inside
//! [`crate::git`]; a missing file on read or delete is an absent
//! value, never an error. Nothing is retried: a partially rebuilt
//! branch would corrupt the base for every branch after it, so the
//! engine prefers halting over partial recovery.

use std::fmt;
use std::path::PathBuf;

use crate::git::GitError;
use crate::plan::PlanError;

/// Unified error type for a restage run.
#[derive(Debug)]
pub enum RestageError {
    /// A strict git command failed.
    Git(GitError),
    /// The plan could not be loaded or failed validation.
    Plan(PlanError),
    /// Filesystem failure on a tracked path.
    Io {
        /// Repository-relative path being read, written, or removed.
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RestageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for RestageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Git(e) => {
                write!(
                    f,
                    "{e}\n  To fix: inspect the repository (git status, git log), then re-run. \
                     Every stage is a hard reset, so a fresh run from the start is safe."
                )
            }
            Self::Plan(e) => {
                write!(f, "{e}\n  To fix: correct the plan document and re-run.")
            }
            Self::Io { path, source } => {
                write!(
                    f,
                    "I/O error at '{}': {source}\n  To fix: check file permissions and disk space.",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for RestageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Git(e) => Some(e),
            Self::Plan(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<GitError> for RestageError {
    fn from(e: GitError) -> Self {
        Self::Git(e)
    }
}

impl From<PlanError> for RestageError {
    fn from(e: PlanError) -> Self {
        Self::Plan(e)
    }
}
