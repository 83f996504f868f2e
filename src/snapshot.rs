//! Pre-reset preservation of the most advanced branch's files.
//!
//! Every rebuild step is a destructive hard reset, and the advanced
//! branch's working tree is the only place its full-feature files
//! exist. The sequencer therefore captures them into memory strictly
//! before the first reset, and replays them into the terminal branch
//! at the end. A snapshot lives for one run; nothing is persisted.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::error::RestageError;
use crate::fsops;
use crate::git::Git;
use crate::plan::SnapshotSpec;

/// In-memory capture of (path → content), in path order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    files: BTreeMap<String, String>,
    missing: Vec<String>,
}

impl Snapshot {
    /// Check out `spec.source` and read every listed path.
    ///
    /// Paths absent on the source branch are skipped (later stages
    /// may legitimately not need every path), but each gap is logged
    /// and recorded in [`missing`](Self::missing) rather than silently
    /// absorbed: a thinner-than-expected capture usually means a prior
    /// partial run already lost content.
    ///
    /// # Errors
    /// Fails if the source branch cannot be checked out or a present
    /// file cannot be read.
    pub fn capture(git: &Git, spec: &SnapshotSpec) -> Result<Self, RestageError> {
        git.checkout(&spec.source)?;

        let mut files = BTreeMap::new();
        let mut missing = Vec::new();
        for path in &spec.paths {
            match fsops::read_if_present(git.root(), path)
                .map_err(|e| RestageError::io(path, e))?
            {
                Some(content) => {
                    files.insert(path.clone(), content);
                }
                None => {
                    warn!(path = %path, source = %spec.source, "snapshot path missing on source branch");
                    missing.push(path.clone());
                }
            }
        }

        info!(
            captured = files.len(),
            missing = missing.len(),
            source = %spec.source,
            "snapshot captured"
        );
        Ok(Self { files, missing })
    }

    /// Write every captured file back under `root`.
    ///
    /// # Errors
    /// Propagates filesystem failures.
    pub fn restore(&self, root: &Path) -> Result<(), RestageError> {
        for (path, content) in &self.files {
            fsops::write_file(root, path, content).map_err(|e| RestageError::io(path, e))?;
        }
        Ok(())
    }

    /// Number of captured files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Listed paths that were absent on the source branch.
    #[must_use]
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}
