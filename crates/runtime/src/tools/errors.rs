use thiserror::Error;

/// Why a single tool call failed.
///
/// These never escape the tool gateway; they become failure outcomes that the
/// model sees as tool results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Execution(String),
}

/// Failures reported by a tool server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The server could not be reached or stopped answering.
    #[error("server unavailable: {0}")]
    Unavailable(String),
    /// The server answered with something that is not valid MCP.
    #[error("malformed server response: {0}")]
    Malformed(String),
    /// The server rejected the request or the tool reported an error.
    #[error("{0}")]
    Rejected(String),
}
