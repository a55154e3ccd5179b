//! Deployment orchestration for toolforge.
//!
//! Takes a scanned project bundle to a running deployment: bundle assembly
//! ([`bundle`]), the hosting-platform client ([`client`]), the injectable
//! poll clock ([`ticker`]), and the poll-and-probe orchestrator
//! ([`orchestrate`]).

pub mod bundle;
pub mod client;
pub mod error;
pub mod orchestrate;
pub mod state;
pub mod ticker;

pub use bundle::{DEFAULT_HOST_CONFIG, build_request};
pub use client::{
    DeploymentRequest, DeploymentStatus, FilePayload, HostingClient, HostingConfig,
    HttpHostingClient,
};
pub use error::{DeployError, Result};
pub use orchestrate::{DeployConfig, Deployer};
pub use state::{DeploymentRecord, DeploymentState};
pub use ticker::{IntervalTicker, Ticker};
