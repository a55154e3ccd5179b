//! Shared vocabulary for the toolforge pipeline.
//!
//! This crate is used by every pipeline stage:
//! - `toolforge-source` (normalization output)
//! - `toolforge-codegen` (the generation contract)
//! - `toolforge-scanner` / `toolforge-deploy` (project bundles)
//! - `toolforge-pipeline` (the `GeneratedServer` record)
//!
//! It intentionally contains **no** network clients and **no** stage logic.

pub mod manifest;
pub mod policy;
pub mod project;
pub mod slug;
pub mod source;
pub mod tool;

pub use manifest::{DependencyGroup, PackageManifest};
pub use project::ProjectFiles;
pub use slug::slugify;
pub use source::{
    AuthMethod, Endpoint, EndpointParameter, NormalizedSource, PrebuiltGeneration,
    SourceDescriptor, SourceKind,
};
pub use tool::ToolDef;
