use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use pgg::compare::{run_modes, write_outputs};
use pgg::core::summary::summarize;
use pgg::core::types::Governance;
use pgg::engine::Engine;
use pgg::exit_codes;
use pgg::io::config::{ConfigOverrides, SimConfig, load_config, write_config};
use pgg::io::export::{Columns, write_csv};
use pgg::{SimError, logging};

const DEFAULT_CONFIG: &str = "pgg.toml";

#[derive(Parser)]
#[command(
    name = "pgg",
    version,
    about = "Public Goods Game simulator with optional governance"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file.
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Load and validate the config, then print it with defaults filled in.
    Validate {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Play one governed run and export its records.
    Run {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        #[command(flatten)]
        overrides: OverrideArgs,
        /// Governance mode: none, punishment or reward.
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        out: PathBuf,
        /// Append `governance` and `player_type` columns.
        #[arg(long)]
        with_labels: bool,
    },
    /// Run every governance mode with one seed and write the comparison.
    Compare {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        #[command(flatten)]
        overrides: OverrideArgs,
        #[arg(long)]
        out_dir: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct OverrideArgs {
    #[arg(long, allow_negative_numbers = true)]
    players: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    endowment: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    multiplier: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    rounds: Option<i64>,
    #[arg(long)]
    seed: Option<u64>,
}

impl OverrideArgs {
    fn into_overrides(self, mode: Option<String>) -> ConfigOverrides {
        ConfigOverrides {
            players: self.players,
            endowment: self.endowment,
            multiplier: self.multiplier,
            rounds: self.rounds,
            seed: self.seed,
            governance: mode,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match run(cli) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init { config, force } => cmd_init(&config, force),
        Command::Validate { config } => cmd_validate(&config),
        Command::Run {
            config,
            overrides,
            mode,
            out,
            with_labels,
        } => cmd_run(&config, overrides.into_overrides(mode), &out, with_labels),
        Command::Compare {
            config,
            overrides,
            out_dir,
        } => cmd_compare(&config, overrides.into_overrides(None), &out_dir),
    }
}

/// Map the first [`SimError`] in the chain to a stable exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.chain().find_map(|cause| cause.downcast_ref::<SimError>()) {
        Some(SimError::Io { .. }) => exit_codes::IO,
        _ => exit_codes::INVALID,
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        println!("init: config={} exists (use --force to overwrite)", path.display());
        return Ok(());
    }
    write_config(path, &SimConfig::default())
        .with_context(|| format!("write {}", path.display()))?;
    println!("init: config={}", path.display());
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let config = load_config(path).with_context(|| format!("load {}", path.display()))?;
    let rendered = toml::to_string_pretty(&config)
        .map_err(|err| SimError::Serialize(err.to_string()))
        .context("render config")?;
    print!("{rendered}");
    if !config.is_social_dilemma() {
        eprintln!(
            "warning: multiplier {} is outside (1, {}); the game is not a social dilemma",
            config.multiplier, config.players
        );
    }
    Ok(())
}

fn resolve_config(path: &Path, overrides: &ConfigOverrides) -> Result<SimConfig> {
    let config = load_config(path).with_context(|| format!("load {}", path.display()))?;
    debug!(?overrides, "applying overrides");
    Ok(config.apply(overrides)?)
}

fn cmd_run(path: &Path, overrides: ConfigOverrides, out: &Path, with_labels: bool) -> Result<()> {
    let config = resolve_config(path, &overrides)?;
    let governance = config.governance;
    let mut engine = Engine::new(config)?;
    engine.run(governance);
    let records = engine.records();

    let columns = if with_labels {
        Columns::LABELLED
    } else {
        Columns::BASE
    };
    write_csv(out, records, columns).with_context(|| format!("export {}", out.display()))?;

    let summary = summarize(records);
    let mode = summary.mode(governance);
    println!(
        "run: mode={} seed={} rounds={} records={} opening_mean={:.2} final_mean={:.2} out={}",
        governance,
        engine.seed(),
        engine.config().rounds,
        records.len(),
        mode.map_or(0.0, |m| m.opening_mean_contribution),
        mode.map_or(0.0, |m| m.final_mean_contribution),
        out.display()
    );
    Ok(())
}

fn cmd_compare(path: &Path, overrides: ConfigOverrides, out_dir: &Path) -> Result<()> {
    let config = resolve_config(path, &overrides)?;
    let comparison = run_modes(&config, &Governance::ALL)?;
    let paths = write_outputs(out_dir, &comparison)
        .with_context(|| format!("write outputs to {}", out_dir.display()))?;

    let summary = comparison.summary();
    for mode in &summary.modes {
        println!(
            "compare: mode={} opening_mean={:.2} final_mean={:.2} mean_reward={:.2} zero_rewards={}",
            mode.governance,
            mode.opening_mean_contribution,
            mode.final_mean_contribution,
            mode.mean_reward,
            mode.zero_rewards
        );
    }
    println!(
        "compare: seed={} combined={} report={}",
        comparison.seed,
        paths.combined.display(),
        paths.report.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["pgg", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true, .. }));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::parse_from(["pgg", "-v", "validate", "-v"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn parse_run_with_overrides() {
        let cli = Cli::parse_from([
            "pgg",
            "run",
            "--players",
            "-3",
            "--mode",
            "reward",
            "--out",
            "out.csv",
            "--with-labels",
        ]);
        let Command::Run {
            overrides,
            mode,
            with_labels,
            ..
        } = cli.command
        else {
            panic!("expected run command");
        };
        assert_eq!(overrides.players, Some(-3));
        assert_eq!(mode.as_deref(), Some("reward"));
        assert!(with_labels);
    }

    #[test]
    fn parse_compare_requires_out_dir() {
        assert!(Cli::try_parse_from(["pgg", "compare"]).is_err());
        let cli = Cli::parse_from(["pgg", "compare", "--out-dir", "out", "--seed", "7"]);
        assert!(matches!(cli.command, Command::Compare { .. }));
    }

    #[test]
    fn io_errors_map_to_io_exit_code() {
        let err = anyhow::Error::from(SimError::Io {
            path: PathBuf::from("x"),
            source: std::io::Error::other("denied"),
        })
        .context("export x");
        assert_eq!(exit_code_for(&err), exit_codes::IO);
    }

    #[test]
    fn config_errors_map_to_invalid_exit_code() {
        let err = anyhow::Error::from(SimError::Config("players must be > 0".into()));
        assert_eq!(exit_code_for(&err), exit_codes::INVALID);
    }
}
