use thiserror::Error;

/// Errors from chat-completion calls.
///
/// Both variants end the current turn; neither is retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The provider could not be reached or answered with a failure status.
    #[error("model unavailable: {0}")]
    Unavailable(String),

    /// The provider answered, but the response is missing an expected field
    /// or cannot be decoded.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}
