use anyhow::Result;
use clap::{Parser, Subcommand};

mod doctor;
mod format;
mod run;
mod telemetry;

/// Branch-progression restager
///
/// restage rewrites a fixed, linear progression of branches so each
/// branch's tree reflects its feature stage instead of six identical
/// trees with diverging commit messages. Each branch is checked out,
/// hard-reset to the branch before it, given its stage's file set,
/// and recommitted, in strict order, with the most advanced branch's
/// files captured before the first reset destroys them.
///
/// DESTRUCTIVE: every branch in the plan loses its unique commits on
/// each run. Run `restage doctor` first, and keep a remote copy until
/// you are happy with the result.
///
/// QUICK START:
///
///   restage doctor          # preflight: tools, branches, clean tree
///   restage plan            # show what would be rebuilt
///   restage run             # rebuild every branch, print push banner
///
/// The built-in plan targets the original six-branch progression; use
/// --plan <file> to restage a different repository.
#[derive(Parser)]
#[command(name = "restage")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'restage <command> --help' for more information on a specific command.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild every branch in the plan, in progression order
    ///
    /// Captures the advanced-file snapshot, then for each branch:
    /// checkout, hard-reset to its base, apply the stage, commit.
    /// Halts in place on the first failure; re-run from the start
    /// to recover. On success, prints the force-push instruction.
    Run(run::RunArgs),

    /// Resolve and validate the plan without touching the repository
    Plan(run::PlanArgs),

    /// Check system requirements and repository state
    ///
    /// Verifies git is installed, the target is a work tree, every
    /// plan branch exists, and the working tree is clean enough to
    /// survive a hard reset.
    Doctor(doctor::DoctorArgs),
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run::run(&args),
        Commands::Plan(args) => run::show_plan(&args),
        Commands::Doctor(args) => doctor::run(&args),
    }
}
