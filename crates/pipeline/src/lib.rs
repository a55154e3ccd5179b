//! The toolforge pipeline: record lifecycle, stage orchestration, and the
//! CLI's configuration.
//!
//! The flow is strictly forward: normalize → generate → scan (gate) →
//! deploy → document, with each stage driving one status transition on the
//! shared [`server::GeneratedServer`] record.

pub mod config;
mod docs;
pub mod error;
pub mod flight;
pub mod runner;
pub mod server;
pub mod status;
pub mod store;

pub use config::{ConfigError, PipelineConfig};
pub use error::{PipelineError, Result};
pub use runner::Pipeline;
pub use server::{CodeSnapshot, GeneratedServer, PREVIOUS_VERSIONS_CAP};
pub use status::ServerStatus;
pub use store::ServerStore;
