//! Simulation configuration stored as TOML (default `pgg.toml`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::agent::Behavior;
use crate::core::policy::Policy;
use crate::core::population::PopulationMix;
use crate::core::round::GameRules;
use crate::core::types::Governance;
use crate::error::{Result, SimError};

/// Simulation configuration (TOML).
///
/// Intended to be edited by humans. Missing fields fall back to the classroom
/// defaults: 10 players, endowment 10, multiplier 2.0, 15 rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Population size N.
    pub players: u32,
    /// Per-round endowment E.
    pub endowment: u32,
    /// Pool multiplier M. A social dilemma needs `1 < M < N`.
    pub multiplier: f64,
    pub rounds: u32,
    /// Seed for the run's random source. Resolved from entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Mode used by single runs.
    pub governance: Governance,
    pub population: PopulationMix,
    pub behavior: Behavior,
    pub policy: Policy,
}

/// Largest accepted population size.
pub const MAX_PLAYERS: u32 = 1_000;
/// Largest accepted round count.
pub const MAX_ROUNDS: u32 = 1_000;

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            players: 10,
            endowment: 10,
            multiplier: 2.0,
            rounds: 15,
            seed: None,
            governance: Governance::None,
            population: PopulationMix::default(),
            behavior: Behavior::default(),
            policy: Policy::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.players == 0 {
            return Err(SimError::config("players must be > 0"));
        }
        if self.endowment == 0 {
            return Err(SimError::config("endowment must be > 0"));
        }
        if self.rounds == 0 {
            return Err(SimError::config("rounds must be > 0"));
        }
        if self.players > MAX_PLAYERS {
            return Err(SimError::config(format!(
                "players must be <= {MAX_PLAYERS}, got {}",
                self.players
            )));
        }
        if self.rounds > MAX_ROUNDS {
            return Err(SimError::config(format!(
                "rounds must be <= {MAX_ROUNDS}, got {}",
                self.rounds
            )));
        }
        // The pool is a u32 sum of contributions capped at the endowment.
        if u64::from(self.players) * u64::from(self.endowment) > u64::from(u32::MAX) {
            return Err(SimError::config(format!(
                "players * endowment must fit the pool, got {} * {}",
                self.players, self.endowment
            )));
        }
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(SimError::config(format!(
                "multiplier must be a finite value > 0, got {}",
                self.multiplier
            )));
        }
        self.population.validate()?;
        self.behavior.validate()?;
        self.policy.validate()?;
        Ok(())
    }

    /// True when free-riding is privately dominant yet collectively harmful.
    pub fn is_social_dilemma(&self) -> bool {
        self.multiplier > 1.0 && self.multiplier < f64::from(self.players)
    }

    pub fn rules(&self) -> GameRules {
        GameRules {
            endowment: self.endowment,
            multiplier: self.multiplier,
            players: self.players,
            behavior: self.behavior.clone(),
            policy: self.policy.clone(),
        }
    }

    /// Apply command-line overrides and re-validate.
    pub fn apply(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(players) = overrides.players {
            self.players = positive("players", players)?;
        }
        if let Some(endowment) = overrides.endowment {
            self.endowment = positive("endowment", endowment)?;
        }
        if let Some(rounds) = overrides.rounds {
            self.rounds = positive("rounds", rounds)?;
        }
        if let Some(multiplier) = overrides.multiplier {
            self.multiplier = multiplier;
        }
        if let Some(seed) = overrides.seed {
            self.seed = Some(seed);
        }
        if let Some(mode) = &overrides.governance {
            self.governance = mode.parse()?;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Overrides collected from the command line.
///
/// Integers are signed so that negative input reaches validation and is
/// reported as a configuration error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub players: Option<i64>,
    pub endowment: Option<i64>,
    pub multiplier: Option<f64>,
    pub rounds: Option<i64>,
    pub seed: Option<u64>,
    pub governance: Option<String>,
}

fn positive(name: &str, value: i64) -> Result<u32> {
    if value <= 0 {
        return Err(SimError::config(format!("{name} must be > 0, got {value}")));
    }
    u32::try_from(value)
        .map_err(|_| SimError::config(format!("{name} is too large, got {value}")))
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SimConfig::default()`.
pub fn load_config(path: &Path) -> Result<SimConfig> {
    if !path.exists() {
        let cfg = SimConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).map_err(|err| SimError::io(path, err))?;
    parse_config(&contents).map_err(|err| match err {
        SimError::Config(message) => SimError::config(format!("{}: {message}", path.display())),
        other => other,
    })
}

/// Parse and validate config from TOML text.
pub fn parse_config(contents: &str) -> Result<SimConfig> {
    let cfg: SimConfig =
        toml::from_str(contents).map_err(|err| SimError::config(format!("parse toml: {err}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SimConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf =
        toml::to_string_pretty(cfg).map_err(|err| SimError::Serialize(err.to_string()))?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| SimError::io(parent, err))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents).map_err(|err| SimError::io(&tmp_path, err))?;
    fs::rename(&tmp_path, path).map_err(|err| SimError::io(path, err))?;
    Ok(())
}
