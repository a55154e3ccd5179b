//! Deployment error types.
//!
//! Timeout, terminal-state, and health failures are deliberately distinct
//! variants: the caller treats "the platform said error" differently from
//! "we stopped waiting" and from "the platform said ready but the app is
//! not serving".

use crate::state::DeploymentState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("hosting platform returned {status}: {body}")]
    Platform { status: u16, body: String },
    #[error("hosting transport error: {0}")]
    Transport(String),
    #[error("deployment bundle error: {0}")]
    Bundle(String),
    #[error("hosting platform reported no deployment URL")]
    MissingUrl,
    #[error("deployment entered terminal state {state}")]
    TerminalState { state: DeploymentState },
    #[error("deployment did not become ready within {0}s")]
    Timeout(u64),
    #[error("deployment canceled")]
    Canceled,
    #[error("health check failed for {url}: {reason}")]
    HealthCheck { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DeployError>;

impl From<reqwest::Error> for DeployError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(toolforge_fetch::sanitize_reqwest_error(&value))
    }
}
