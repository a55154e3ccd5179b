//! Pipeline error umbrella.
//!
//! Stage errors cross the boundary unchanged; the variants added here are
//! the pipeline's own: record lookup, transition legality, the security
//! gate, and the single-flight deploy guard.

use crate::status::ServerStatus;
use thiserror::Error;
use toolforge_codegen::CodegenError;
use toolforge_deploy::DeployError;
use toolforge_source::SourceError;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no server with id {0}")]
    NotFound(Uuid),
    #[error("illegal status transition {from} → {to}")]
    InvalidTransition {
        from: ServerStatus,
        to: ServerStatus,
    },
    #[error("deploy blocked by the security gate: {reason}")]
    SecurityGate { reason: String },
    #[error("a deployment for server {0} is already in flight")]
    DeployInFlight(Uuid),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error(transparent)]
    Deploy(#[from] DeployError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
