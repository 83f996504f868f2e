//! Shared test helpers for restage integration tests.
//!
//! All tests use temp directories, so there are no side effects on
//! the real repo.
//! Each test gets its own git repo via `setup_progression_repo()` plus
//! a plan file via `plan_file()`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// A small progression plan mirroring the shape of the built-in one:
/// a skeleton stage with deletions, additive stages, a deliberately
/// empty stage, and a terminal branch restored from the snapshot.
pub const TEST_PLAN: &str = r#"
final_checkout = "main"

[snapshot]
source = "demo/final"
paths = ["src/engine.js", "src/sync.js", "src/chat.js", "app/home.js"]

[[branches]]
name = "main"
base = "HEAD"
message = "setup: navigation skeleton"
remove_dirs = ["src"]
remove_files = ["app/extra.js"]

[[branches.writes]]
path = "app/home.js"
content = "home v1\n"

[[branches.writes]]
path = "app/nav.js"
content = "nav v1\n"

[[branches]]
name = "feat/engine"
base = "main"
message = "feat: risk engine"

[[branches.writes]]
path = "src/engine.js"
content = "engine v1\n"

[[branches.writes]]
path = "app/home.js"
content = "home v2\n"

[[branches]]
name = "feat/noop"
base = "feat/engine"
message = "feat: placeholder stage"

[[branches]]
name = "feat/store"
base = "feat/noop"
message = "feat: storage"

[[branches.writes]]
path = "src/store.js"
content = "store v1\n"

[[branches]]
name = "feat/alerts"
base = "feat/store"
message = "feat: alerts"

[[branches.writes]]
path = "src/alerts.js"
content = "alerts v1\n"

[[branches.writes]]
path = "app/home.js"
content = "home v3\n"

[[branches]]
name = "demo/final"
base = "feat/alerts"
message = "feat: full app"
restore_snapshot = true
"#;

/// Run a git command in the given directory. Panics on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {}: {e}", args.join(" ")));
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "git {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.trim().to_string()
}

/// Write a file inside the repo, creating parents.
pub fn write_file(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
}

/// Create a git repo with the six-branch fixture progression:
/// five stale branches parked at main's initial commit, plus
/// `demo/final` holding the advanced file set.
pub fn setup_progression_repo() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    let root = dir.path();

    git(root, &["init"]);
    git(root, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(root, &["config", "user.name", "restage-test"]);
    git(root, &["config", "user.email", "restage@test.invalid"]);
    git(root, &["config", "commit.gpgsign", "false"]);

    // Initial (stale) state on main.
    write_file(root, "README.md", "# fixture repo\n");
    write_file(root, "app/home.js", "home v0\n");
    write_file(root, "app/extra.js", "extra v0\n");
    write_file(root, "src/old.js", "old v0\n");
    git(root, &["add", "-A"]);
    git(root, &["commit", "-m", "initial commit"]);

    for branch in ["feat/engine", "feat/noop", "feat/store", "feat/alerts"] {
        git(root, &["branch", branch]);
    }

    // The advanced branch: the only place full-feature files live.
    git(root, &["checkout", "-b", "demo/final"]);
    write_file(root, "src/engine.js", "engine vFull\n");
    write_file(root, "src/sync.js", "sync vFull\n");
    write_file(root, "src/chat.js", "chat vFull\n");
    write_file(root, "app/home.js", "home vFull\n");
    git(root, &["add", "-A"]);
    git(root, &["commit", "-m", "full app"]);
    git(root, &["checkout", "main"]);

    dir
}

/// Write a plan document into its own temp dir (kept outside the repo
/// so `git add -A` never sweeps it into a rebuilt branch).
pub fn plan_file(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create plan temp dir");
    let path = dir.path().join("plan.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// Run restage with the given args in the given directory.
pub fn restage_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_restage"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to execute restage")
}

/// Run restage and assert it succeeds. Returns stdout as string.
pub fn restage_ok(dir: &Path, args: &[&str]) -> String {
    let out = restage_in(dir, args);
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "restage {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.to_string()
}

/// Run restage and assert it fails. Returns stderr as string.
pub fn restage_fails(dir: &Path, args: &[&str]) -> String {
    let out = restage_in(dir, args);
    assert!(
        !out.status.success(),
        "Expected restage {} to fail, but it succeeded.\nstdout: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
    );
    String::from_utf8_lossy(&out.stderr).to_string()
}

/// Sorted list of every path in a branch's tip tree.
pub fn tree_paths(dir: &Path, branch: &str) -> Vec<String> {
    let mut paths: Vec<String> = git(dir, &["ls-tree", "-r", "--name-only", branch])
        .lines()
        .map(str::to_owned)
        .collect();
    paths.sort();
    paths
}

/// The tree OID of a branch's tip (content identity, not commit hash).
pub fn tree_oid(dir: &Path, branch: &str) -> String {
    git(dir, &["rev-parse", &format!("{branch}^{{tree}}")])
}

/// File content at a branch's tip.
pub fn show(dir: &Path, branch: &str, path: &str) -> String {
    git(dir, &["show", &format!("{branch}:{path}")])
}
