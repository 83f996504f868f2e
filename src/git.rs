//! Git command execution against an explicit repository root.
//!
//! Everything restage does to a repository goes through [`Git`]: one
//! synchronous subprocess per git subcommand, stdout/stderr captured,
//! stdout trimmed. The repository root is fixed at construction and
//! passed to every subprocess; no component reads it from ambient
//! process state.
//!
//! # Failure semantics
//!
//! Every call takes a [`Strictness`]. `Strict` turns a non-zero exit
//! into [`GitError::Command`] carrying the command line and the
//! captured output; `BestEffort` swallows the failure and returns
//! empty output. The sequencer's contract on top of this is
//! fail-fast: a broken reset mid-sequence would corrupt the base for
//! every later branch, so nothing is retried.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

// ---------------------------------------------------------------------------
// Strictness
// ---------------------------------------------------------------------------

/// How a non-zero exit status is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strictness {
    /// Non-zero exit aborts the run with the captured output.
    Strict,
    /// Non-zero exit is swallowed; the caller gets empty output.
    ///
    /// Only for cleanup commands whose absence of effect is acceptable
    /// (dropping a stash that may not exist).
    BestEffort,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from running git.
#[derive(Debug)]
pub enum GitError {
    /// git exited non-zero under [`Strictness::Strict`].
    Command {
        /// The command that was run (e.g. `"git reset --hard main"`).
        command: String,
        /// Captured stdout, trimmed.
        stdout: String,
        /// Captured stderr, trimmed.
        stderr: String,
        /// Process exit code, if available.
        exit_code: Option<i32>,
    },
    /// git could not be spawned.
    Io(std::io::Error),
}

impl fmt::Display for GitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command {
                command,
                stdout,
                stderr,
                exit_code,
            } => {
                write!(f, "`{command}` failed")?;
                if let Some(code) = exit_code {
                    write!(f, " (exit code {code})")?;
                }
                if !stdout.is_empty() {
                    write!(f, "\n  stdout: {stdout}")?;
                }
                if !stderr.is_empty() {
                    write!(f, "\n  stderr: {stderr}")?;
                }
                Ok(())
            }
            Self::Io(e) => write!(f, "I/O error spawning git: {e}"),
        }
    }
}

impl std::error::Error for GitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Io(e) = self { Some(e) } else { None }
    }
}

impl From<std::io::Error> for GitError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

/// A handle on one repository. All commands run with the repository
/// root as their working directory.
#[derive(Clone, Debug)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The repository root this handle is bound to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one git subcommand and return its trimmed stdout.
    ///
    /// # Errors
    /// Returns [`GitError::Io`] if git cannot be spawned, or
    /// [`GitError::Command`] on non-zero exit under `Strict`.
    pub fn run(&self, args: &[&str], strictness: Strictness) -> Result<String, GitError> {
        debug!(?args, root = %self.root.display(), "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        match strictness {
            Strictness::BestEffort => {
                debug!(?args, code = output.status.code(), "ignoring best-effort failure");
                Ok(String::new())
            }
            Strictness::Strict => Err(GitError::Command {
                command: format!("git {}", args.join(" ")),
                stdout,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                exit_code: output.status.code(),
            }),
        }
    }

    // -- the five verbs the rebuild engine needs --

    /// `git checkout <branch>`. The branch must already exist.
    ///
    /// # Errors
    /// Fails if the branch does not exist; creating branches is out
    /// of scope for restage.
    pub fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["checkout", branch], Strictness::Strict).map(drop)
    }

    /// `git reset --hard <target>`. Destructive and non-recoverable:
    /// every commit unique to the current branch is discarded.
    ///
    /// # Errors
    /// Fails if `target` does not resolve to a commit.
    pub fn reset_hard(&self, target: &str) -> Result<(), GitError> {
        self.run(&["reset", "--hard", target], Strictness::Strict)
            .map(drop)
    }

    /// `git add -A`.
    ///
    /// # Errors
    /// Fails on index corruption or unreadable paths.
    pub fn add_all(&self) -> Result<(), GitError> {
        self.run(&["add", "-A"], Strictness::Strict).map(drop)
    }

    /// `git commit -m <message>`.
    ///
    /// # Errors
    /// Fails on an empty index or missing committer identity; the
    /// rebuild layer checks [`is_clean`](Self::is_clean) first so the
    /// empty-index case never reaches git.
    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run(&["commit", "-m", message], Strictness::Strict)
            .map(drop)
    }

    /// `git stash drop`, best-effort. A missing stash is not an error.
    ///
    /// # Errors
    /// Only if git itself cannot be spawned.
    pub fn drop_stash(&self) -> Result<(), GitError> {
        self.run(&["stash", "drop"], Strictness::BestEffort)
            .map(drop)
    }

    // -- read-only queries (doctor, tests) --

    /// Resolve a revision to an OID, or `None` if it does not exist.
    ///
    /// # Errors
    /// Returns an error if git fails for a reason other than the
    /// revision being unknown.
    pub fn rev_parse(&self, rev: &str) -> Result<Option<String>, GitError> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", rev])
            .current_dir(&self.root)
            .output()?;

        if output.status.success() {
            return Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_owned(),
            ));
        }

        // --quiet exits 1 with no output for an unknown revision.
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr_trimmed = stderr.trim();
        if stderr_trimmed.is_empty()
            || stderr_trimmed.contains("unknown revision")
            || stderr_trimmed.contains("Needed a single revision")
        {
            return Ok(None);
        }

        Err(GitError::Command {
            command: format!("git rev-parse --verify --quiet {rev}"),
            stdout: String::new(),
            stderr: stderr_trimmed.to_owned(),
            exit_code: output.status.code(),
        })
    }

    /// Whether a local branch exists.
    ///
    /// # Errors
    /// See [`rev_parse`](Self::rev_parse).
    pub fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        Ok(self.rev_parse(&format!("refs/heads/{name}"))?.is_some())
    }

    /// The currently checked-out branch, or `None` when HEAD is detached.
    ///
    /// # Errors
    /// Only if git cannot be spawned.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let output = Command::new("git")
            .args(["symbolic-ref", "--short", "-q", "HEAD"])
            .current_dir(&self.root)
            .output()?;

        if output.status.success() {
            Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_owned(),
            ))
        } else {
            Ok(None)
        }
    }

    /// `git status --porcelain` output, trimmed.
    ///
    /// # Errors
    /// Fails outside a work tree.
    pub fn status_porcelain(&self) -> Result<String, GitError> {
        self.run(&["status", "--porcelain"], Strictness::Strict)
    }

    /// Whether the working tree and index have no pending changes.
    ///
    /// # Errors
    /// See [`status_porcelain`](Self::status_porcelain).
    pub fn is_clean(&self) -> Result<bool, GitError> {
        Ok(self.status_porcelain()?.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Root discovery
// ---------------------------------------------------------------------------

/// Resolve the repository root from the current directory.
///
/// Runs `git rev-parse --show-toplevel` in the process working
/// directory. This is the only place restage consults ambient state,
/// and only to seed the explicit root passed everywhere else.
///
/// # Errors
/// Fails when the current directory is not inside a git work tree.
pub fn discover_root() -> Result<PathBuf, GitError> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()?;

    if !output.status.success() {
        return Err(GitError::Command {
            command: "git rev-parse --show-toplevel".to_owned(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            exit_code: output.status.code(),
        });
    }

    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim(),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Create a fresh git repo with one commit on `main`.
    fn setup_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let git = Git::new(dir.path());

        git.run(&["init"], Strictness::Strict).unwrap();
        git.run(&["symbolic-ref", "HEAD", "refs/heads/main"], Strictness::Strict)
            .unwrap();
        git.run(&["config", "user.name", "restage-test"], Strictness::Strict)
            .unwrap();
        git.run(&["config", "user.email", "restage@test.invalid"], Strictness::Strict)
            .unwrap();
        git.run(&["config", "commit.gpgsign", "false"], Strictness::Strict)
            .unwrap();

        fs::write(dir.path().join("README.md"), "# fixture\n").unwrap();
        git.add_all().unwrap();
        git.commit("initial commit").unwrap();

        dir
    }

    #[test]
    fn run_returns_trimmed_stdout() {
        let dir = setup_repo();
        let git = Git::new(dir.path());
        let branch = git
            .run(&["symbolic-ref", "--short", "HEAD"], Strictness::Strict)
            .unwrap();
        assert_eq!(branch, "main");
    }

    #[test]
    fn strict_failure_carries_command_and_stderr() {
        let dir = setup_repo();
        let git = Git::new(dir.path());
        let err = git.checkout("no-such-branch").unwrap_err();
        match err {
            GitError::Command {
                command,
                stderr,
                exit_code,
                ..
            } => {
                assert_eq!(command, "git checkout no-such-branch");
                assert!(!stderr.is_empty());
                assert_ne!(exit_code, Some(0));
            }
            GitError::Io(e) => panic!("expected Command error, got Io: {e}"),
        }
    }

    #[test]
    fn best_effort_failure_returns_empty_output() {
        let dir = setup_repo();
        let git = Git::new(dir.path());
        // No stash exists: strict would fail, best-effort must not.
        let out = git.run(&["stash", "drop"], Strictness::BestEffort).unwrap();
        assert_eq!(out, "");
        git.drop_stash().unwrap();
    }

    #[test]
    fn checkout_reset_commit_roundtrip() {
        let dir = setup_repo();
        let git = Git::new(dir.path());

        git.run(&["branch", "feature"], Strictness::Strict).unwrap();
        git.checkout("feature").unwrap();
        fs::write(dir.path().join("feature.txt"), "on feature\n").unwrap();
        git.add_all().unwrap();
        git.commit("add feature file").unwrap();

        assert_ne!(
            git.rev_parse("feature").unwrap(),
            git.rev_parse("main").unwrap()
        );

        git.reset_hard("main").unwrap();
        assert_eq!(
            git.rev_parse("feature").unwrap(),
            git.rev_parse("main").unwrap()
        );
        assert!(!dir.path().join("feature.txt").exists());
    }

    #[test]
    fn rev_parse_missing_revision_is_none() {
        let dir = setup_repo();
        let git = Git::new(dir.path());
        assert_eq!(git.rev_parse("refs/heads/ghost").unwrap(), None);
        assert!(git.rev_parse("main").unwrap().is_some());
    }

    #[test]
    fn branch_exists_distinguishes_branches() {
        let dir = setup_repo();
        let git = Git::new(dir.path());
        assert!(git.branch_exists("main").unwrap());
        assert!(!git.branch_exists("ghost").unwrap());
    }

    #[test]
    fn current_branch_and_detached_head() {
        let dir = setup_repo();
        let git = Git::new(dir.path());
        assert_eq!(git.current_branch().unwrap().as_deref(), Some("main"));

        let head = git.rev_parse("HEAD").unwrap().unwrap();
        git.checkout(&head).unwrap();
        assert_eq!(git.current_branch().unwrap(), None);
    }

    #[test]
    fn is_clean_tracks_working_tree_state() {
        let dir = setup_repo();
        let git = Git::new(dir.path());
        assert!(git.is_clean().unwrap());

        fs::write(dir.path().join("dirty.txt"), "x\n").unwrap();
        assert!(!git.is_clean().unwrap());
    }

    #[test]
    fn error_display_includes_captured_output() {
        let err = GitError::Command {
            command: "git reset --hard ghost".to_owned(),
            stdout: "some stdout".to_owned(),
            stderr: "fatal: ambiguous argument".to_owned(),
            exit_code: Some(128),
        };
        let msg = format!("{err}");
        assert!(msg.contains("git reset --hard ghost"));
        assert!(msg.contains("exit code 128"));
        assert!(msg.contains("some stdout"));
        assert!(msg.contains("fatal: ambiguous argument"));
    }

    #[test]
    fn error_display_omits_empty_output() {
        let err = GitError::Command {
            command: "git add -A".to_owned(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(1),
        };
        let msg = format!("{err}");
        assert!(!msg.contains("stdout:"));
        assert!(!msg.contains("stderr:"));
    }
}
