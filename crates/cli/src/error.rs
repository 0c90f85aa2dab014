//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
///
/// Every variant is reported on stderr; none changes the exit status.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Settings or the servers file are missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The server could not be started or its tools listed.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// The step log directory could not be prepared.
    #[error("step log: {0}")]
    StepLog(#[from] steplog::Error),

    /// An I/O error occurred on the terminal.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
