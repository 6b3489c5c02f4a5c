mod cli;
mod config;
mod experiment;
mod judge;
mod outcome;
mod report;
mod results;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lab", version, about = "Experiment harness for the pgg simulator")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List experiments under `lab/experiments/`.
    List,
    /// Run an experiment; each run gets its own seed and results directory.
    Run {
        experiment_id: String,
        #[arg(long, default_value_t = 1)]
        runs: u32,
    },
    /// Aggregate every recorded run of an experiment.
    Report {
        experiment_id: String,
    },
    /// Delete the recorded runs of an experiment.
    Clean {
        experiment_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    pgg::logging::init(cli.verbose);
    let repo_root = std::env::current_dir()?;
    match cli.command {
        Command::List => cli::list_experiments(&repo_root),
        Command::Run {
            experiment_id,
            runs,
        } => cli::run_experiment_by_id(&repo_root, &experiment_id, runs),
        Command::Report { experiment_id } => cli::report_experiment(&repo_root, &experiment_id),
        Command::Clean { experiment_id } => cli::clean_experiment(&repo_root, &experiment_id),
    }
}
