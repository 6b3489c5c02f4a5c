//! Error types for the simulator library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Unified error type for simulator operations.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration, rejected before any round is played.
    #[error("configuration error: {0}")]
    Config(String),

    /// File-system failure in an export or config collaborator.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl SimError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SimError::Config(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}
