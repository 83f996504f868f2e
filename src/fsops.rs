//! Filesystem primitives rooted at the repository.
//!
//! Full-replace write semantics, no-op removals, no diffing. All
//! functions take the repository root plus a relative path and are
//! idempotent: re-running with the same inputs leaves the tree in the
//! same observable state.

use std::fs;
use std::io;
use std::path::Path;

/// Write `content` to `rel` under `root`, creating missing parent
/// directories and overwriting any existing file.
///
/// # Errors
/// Propagates I/O failures other than the create/overwrite happy path.
pub fn write_file(root: &Path, rel: &str, content: &str) -> io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)
}

/// Delete the file at `rel` if it exists; absent is a no-op.
///
/// # Errors
/// Propagates I/O failures other than not-found.
pub fn remove_file(root: &Path, rel: &str) -> io::Result<()> {
    match fs::remove_file(root.join(rel)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Recursively delete the directory at `rel` if it exists; absent is
/// a no-op.
///
/// # Errors
/// Propagates I/O failures other than not-found.
pub fn remove_dir(root: &Path, rel: &str) -> io::Result<()> {
    match fs::remove_dir_all(root.join(rel)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Read the file at `rel`, or `None` if it does not exist.
///
/// # Errors
/// Propagates I/O failures other than not-found.
pub fn read_if_present(root: &Path, rel: &str) -> io::Result<Option<String>> {
    match fs::read_to_string(root.join(rel)) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
