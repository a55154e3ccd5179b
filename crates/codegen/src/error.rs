//! Code-generation error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    /// The model reply contained no parseable JSON, or JSON of the wrong
    /// shape. Carries the start of the reply so the failure is debuggable
    /// without logging the whole payload.
    #[error("model reply violates the generation contract (reply starts with: {snippet:?})")]
    Contract { snippet: String },
    #[error("model service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("model transport error: {0}")]
    Transport(String),
    #[error("model call timed out after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, CodegenError>;

impl From<reqwest::Error> for CodegenError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(toolforge_fetch::sanitize_reqwest_error(&value))
    }
}
