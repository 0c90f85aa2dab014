use thiserror::Error;

/// Errors that end a session before it starts.
///
/// Once a session is running, model and tool failures are reported inside the
/// turn output instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("tool discovery failed: {0}")]
    Discovery(String),
}

pub type Result<T> = std::result::Result<T, Error>;
