use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use restage::git::Git;
use restage::plan::RebuildPlan;

use crate::format::OutputFormat;
use crate::run::load_plan;

/// Check system requirements and repository state
#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Repository root (default: discovered via `git rev-parse --show-toplevel`)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Plan file (default: the built-in six-branch progression)
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct DoctorEnvelope {
    checks: Vec<DoctorCheck>,
    all_ok: bool,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<String>,
}

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self {
            name: name.to_owned(),
            status: "ok".to_owned(),
            message,
            fix: None,
        }
    }

    fn warn(name: &str, message: String, fix: Option<String>) -> Self {
        Self {
            name: name.to_owned(),
            status: "warn".to_owned(),
            message,
            fix,
        }
    }

    fn fail(name: &str, message: String, fix: String) -> Self {
        Self {
            name: name.to_owned(),
            status: "fail".to_owned(),
            message,
            fix: Some(fix),
        }
    }
}

fn print_check(check: &DoctorCheck) {
    let prefix = match check.status.as_str() {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "fail" => "[FAIL]",
        _ => "[???]",
    };
    println!("{} {}", prefix, check.message);
    if let Some(fix) = &check.fix {
        println!("       {fix}");
    }
}

pub fn run(args: &DoctorArgs) -> Result<()> {
    let mut checks = Vec::new();

    checks.push(check_git_installed());

    let root = match &args.root {
        Some(r) => Some(r.clone()),
        None => restage::git::discover_root().ok(),
    };
    checks.push(check_work_tree(root.as_deref()));

    let plan = load_plan(args.plan.as_deref());
    checks.push(match &plan {
        Ok(plan) => DoctorCheck::ok(
            "plan",
            format!(
                "plan: {} branch(es), {} snapshot path(s)",
                plan.branches.len(),
                plan.snapshot.as_ref().map_or(0, |s| s.paths.len())
            ),
        ),
        Err(e) => DoctorCheck::fail(
            "plan",
            format!("plan: {e:#}"),
            "Fix the plan document (restage plan validates without touching the repo).".to_owned(),
        ),
    });

    if let (Some(root), Ok(plan)) = (root.as_deref(), &plan) {
        let git = Git::new(root);
        checks.push(check_branches(&git, plan));
        checks.push(check_snapshot_source(&git, plan));
        checks.push(check_clean_tree(&git));
    }

    let all_ok = checks.iter().all(|c| c.status == "ok");

    match args.format {
        OutputFormat::Json => {
            println!("{}", args.format.serialize(&DoctorEnvelope { checks, all_ok })?);
        }
        OutputFormat::Text => {
            println!("restage doctor");
            println!("==============");
            println!();
            for check in &checks {
                print_check(check);
            }
            println!();
            if all_ok {
                println!("All checks passed!");
            } else {
                println!("Some checks failed. See above for details.");
            }
        }
    }

    Ok(())
}

fn check_git_installed() -> DoctorCheck {
    match Command::new("git").args(["--version"]).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            let version = version.lines().next().unwrap_or("unknown").trim();
            DoctorCheck::ok("git", format!("git: {version}"))
        }
        Ok(_) => DoctorCheck::fail(
            "git",
            "git: found but returned error".to_owned(),
            "Install: https://git-scm.com/downloads".to_owned(),
        ),
        Err(_) => DoctorCheck::fail(
            "git",
            "git: not found".to_owned(),
            "Install: https://git-scm.com/downloads".to_owned(),
        ),
    }
}

fn check_work_tree(root: Option<&Path>) -> DoctorCheck {
    let Some(root) = root else {
        return DoctorCheck::fail(
            "repository",
            "repository: not inside a git work tree".to_owned(),
            "Run inside the target repository or pass --root <dir>.".to_owned(),
        );
    };

    let git = Git::new(root);
    match git.run(&["rev-parse", "--is-inside-work-tree"], restage::git::Strictness::Strict) {
        Ok(out) if out == "true" => {
            DoctorCheck::ok("repository", format!("repository: {}", root.display()))
        }
        Ok(_) => DoctorCheck::fail(
            "repository",
            format!("repository: {} is not a work tree", root.display()),
            "Point --root at a non-bare checkout.".to_owned(),
        ),
        Err(e) => DoctorCheck::fail(
            "repository",
            format!("repository: {e}"),
            "Point --root at a git checkout.".to_owned(),
        ),
    }
}

fn check_branches(git: &Git, plan: &RebuildPlan) -> DoctorCheck {
    let mut missing = Vec::new();
    for branch in &plan.branches {
        match git.branch_exists(&branch.name) {
            Ok(true) => {}
            Ok(false) => missing.push(branch.name.clone()),
            Err(e) => {
                return DoctorCheck::warn(
                    "branches",
                    format!("branches: could not check ({e})"),
                    None,
                );
            }
        }
    }

    if missing.is_empty() {
        DoctorCheck::ok(
            "branches",
            format!("branches: all {} present", plan.branches.len()),
        )
    } else {
        DoctorCheck::fail(
            "branches",
            format!("branches: {} missing: {}", missing.len(), missing.join(", ")),
            "Create them (git branch <name> <start-point>) or edit the plan; restage never creates branches.".to_owned(),
        )
    }
}

fn check_snapshot_source(git: &Git, plan: &RebuildPlan) -> DoctorCheck {
    let Some(snapshot) = &plan.snapshot else {
        return DoctorCheck::ok("snapshot", "snapshot: none configured".to_owned());
    };

    match git.branch_exists(&snapshot.source) {
        Ok(true) => DoctorCheck::ok(
            "snapshot",
            format!(
                "snapshot: source '{}' present ({} path(s) to capture)",
                snapshot.source,
                snapshot.paths.len()
            ),
        ),
        Ok(false) => DoctorCheck::fail(
            "snapshot",
            format!("snapshot: source branch '{}' does not exist", snapshot.source),
            "The advanced branch is the only place full-feature files live; without it the capture fails.".to_owned(),
        ),
        Err(e) => DoctorCheck::warn("snapshot", format!("snapshot: could not check ({e})"), None),
    }
}

fn check_clean_tree(git: &Git) -> DoctorCheck {
    match git.is_clean() {
        Ok(true) => DoctorCheck::ok("working tree", "working tree: clean".to_owned()),
        Ok(false) => DoctorCheck::warn(
            "working tree",
            "working tree: uncommitted changes will be destroyed by the first hard reset".to_owned(),
            Some("Commit or stash them first.".to_owned()),
        ),
        Err(e) => DoctorCheck::warn(
            "working tree",
            format!("working tree: could not check ({e})"),
            None,
        ),
    }
}
