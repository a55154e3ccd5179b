//! Normalization and exploration error types.

use thiserror::Error;
use toolforge_codegen::CodegenError;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid source URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },
    #[error("fetching {url} returned status {status}")]
    FetchStatus { url: String, status: u16 },
    #[error("cannot parse specification document: {0}")]
    SpecParse(String),
    #[error(
        "cannot parse owner/repo from {url:?}; expected https://github.com/<owner>/<repo>"
    )]
    RepoFormat { url: String },
    #[error(
        "repository exploration found no usable files ({reason}); \
         supported extensions: {extensions}"
    )]
    RepoExploration { reason: String, extensions: String },
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl SourceError {
    pub(crate) fn fetch(url: &str, e: &reqwest::Error) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: toolforge_fetch::sanitize_reqwest_error(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
