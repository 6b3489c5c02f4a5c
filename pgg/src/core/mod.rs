//! Deterministic, pure logic of the simulation.
//!
//! Core modules must be free of I/O side effects. Randomness only enters
//! through an explicit `&mut impl Rng`, so every function is reproducible
//! from its inputs and the state of that source.

pub mod adaptation;
pub mod agent;
pub mod invariants;
pub mod payoff;
pub mod policy;
pub mod population;
pub mod round;
pub mod summary;
pub mod types;
