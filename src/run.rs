use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use restage::git::{self, Git};
use restage::plan::RebuildPlan;
use restage::rebuild::Outcome;
use restage::sequence::{self, RunReport};

use crate::format::OutputFormat;

/// Rebuild every branch in the plan
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Repository root (default: discovered via `git rev-parse --show-toplevel`)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Plan file (default: the built-in six-branch progression)
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Output format for the run summary
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Show the resolved plan
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Plan file (default: the built-in six-branch progression)
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let root = resolve_root(args.root.clone())?;
    let plan = load_plan(args.plan.as_deref())?;
    let git = Git::new(&root);

    let report = sequence::run(&git, &plan)?;

    match args.format {
        OutputFormat::Json => println!("{}", args.format.serialize(&report)?),
        OutputFormat::Text => print_report(&plan, &report),
    }
    Ok(())
}

fn print_report(plan: &RebuildPlan, report: &RunReport) {
    println!("All branches rebuilt.");
    println!();
    for branch in &report.branches {
        let note = match branch.outcome {
            Outcome::Committed => "committed",
            Outcome::NothingToCommit => "nothing to commit (points at base)",
        };
        println!("  {:<28} {note}", branch.branch);
    }

    if !report.snapshot_missing.is_empty() {
        println!();
        println!(
            "Warning: {} snapshot path(s) were missing on the source branch and were not restored:",
            report.snapshot_missing.len()
        );
        for path in &report.snapshot_missing {
            println!("  - {path}");
        }
    }

    let names: Vec<&str> = plan.branches.iter().map(|b| b.name.as_str()).collect();
    println!();
    println!("Run this to force-push all branches:");
    println!("  git push origin {} --force", names.join(" "));
}

// ---------------------------------------------------------------------------
// plan subcommand
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PlanEnvelope {
    branches: Vec<PlanBranch>,
    snapshot_source: Option<String>,
    snapshot_paths: usize,
    final_checkout: String,
}

#[derive(Serialize)]
struct PlanBranch {
    name: String,
    base: String,
    message: String,
    writes: usize,
    removals: usize,
    restores_snapshot: bool,
}

pub fn show_plan(args: &PlanArgs) -> Result<()> {
    let plan = load_plan(args.plan.as_deref())?;

    let envelope = PlanEnvelope {
        branches: plan
            .branches
            .iter()
            .map(|b| PlanBranch {
                name: b.name.clone(),
                base: b.base.clone(),
                message: b.message.clone(),
                writes: b.writes.len(),
                removals: b.remove_dirs.len() + b.remove_files.len(),
                restores_snapshot: b.restore_snapshot,
            })
            .collect(),
        snapshot_source: plan.snapshot.as_ref().map(|s| s.source.clone()),
        snapshot_paths: plan.snapshot.as_ref().map_or(0, |s| s.paths.len()),
        final_checkout: plan.final_branch().to_owned(),
    };

    match args.format {
        OutputFormat::Json => println!("{}", args.format.serialize(&envelope)?),
        OutputFormat::Text => {
            println!("Plan: {} branch(es)", envelope.branches.len());
            for branch in &envelope.branches {
                let mut notes = vec![format!("{} write(s)", branch.writes)];
                if branch.removals > 0 {
                    notes.push(format!("{} removal(s)", branch.removals));
                }
                if branch.restores_snapshot {
                    notes.push("restores snapshot".to_owned());
                }
                println!(
                    "  {:<28} <- {:<24} {}",
                    branch.name,
                    branch.base,
                    notes.join(", ")
                );
            }
            if let Some(source) = &envelope.snapshot_source {
                println!("Snapshot: {} path(s) from {source}", envelope.snapshot_paths);
            }
            println!("Final checkout: {}", envelope.final_checkout);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared resolution helpers
// ---------------------------------------------------------------------------

pub fn resolve_root(arg: Option<PathBuf>) -> Result<PathBuf> {
    match arg {
        Some(root) => Ok(root),
        None => git::discover_root().context("not inside a git repository (pass --root <dir>)"),
    }
}

pub fn load_plan(path: Option<&Path>) -> Result<RebuildPlan> {
    let plan = match path {
        Some(p) => RebuildPlan::load(p)?,
        None => RebuildPlan::builtin()?,
    };
    Ok(plan)
}
