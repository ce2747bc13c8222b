//! Error types for the seeding binary.

use polluter::{EngineError, PolluteError};

/// Errors that can stop a seeding run.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// A fixture file could not be opened.
    #[error("open {path}: {source}")]
    Open {
        /// Path as given on the command line.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configured store could not be reached.
    #[error("connect: {0}")]
    Connect(#[from] EngineError),

    /// A fixture could not be applied. Later inputs were not attempted.
    #[error("{input}: {source}")]
    Pollute {
        /// File path, or `-` for stdin.
        input: String,
        /// The pipeline error, carrying the failing stage.
        source: PolluteError,
    },
}
