//! I/O collaborators that consume engine output or feed it configuration.

pub mod config;
pub mod export;
pub mod report;
