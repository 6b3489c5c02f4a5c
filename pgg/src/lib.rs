//! Agent-based simulator of the repeated N-player Public Goods Game.
//!
//! Agents choose how much of a private endowment to put into a shared pool.
//! The pool is multiplied and split equally, so every agent is tempted to
//! free-ride. Three governance regimes (none, punishment, reward) modify the
//! payoffs and, through type-specific adaptation, the contributions.
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (decisions, payoffs, rounds,
//!   invariants, summaries). Randomness is always an explicit `&mut impl Rng`.
//! - **[`io`]**: Side-effecting collaborators (TOML config, CSV export,
//!   rendered reports).
//!
//! [`engine`] owns a population and drives rounds; [`compare`] runs several
//! governance modes from fresh engines and writes every artifact.

pub mod compare;
pub mod core;
pub mod engine;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{Result, SimError};
