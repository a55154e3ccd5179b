//! Repository normalization.
//!
//! Parses the repository identifier, harvests a bounded file subset through
//! the explorer, and asks the model service to infer the API surface from
//! those files.

use crate::error::Result;
use crate::explorer::{Explorer, ExplorerConfig};
use crate::github::{CodeHost, parse_owner_repo};
use std::collections::BTreeMap;
use toolforge_codegen::CodeGenerator;
use toolforge_types::NormalizedSource;
use tracing::{debug, info};

/// Normalizes a repository URL into the common source shape.
///
/// # Errors
///
/// [`crate::SourceError::RepoFormat`] for unparsable URLs,
/// [`crate::SourceError::RepoExploration`] when no usable files exist, fetch
/// errors from metadata/listing calls, and model errors via
/// [`crate::SourceError::Codegen`].
pub async fn normalize_repo(
    host: &CodeHost,
    generator: &CodeGenerator,
    config: ExplorerConfig,
    url: &str,
) -> Result<NormalizedSource> {
    let (owner, repo) = parse_owner_repo(url)?;
    let metadata = host.metadata(&owner, &repo).await?;
    let description = metadata.description.clone().unwrap_or_default();

    let files = Explorer::new(host, config).explore(&owner, &repo).await?;
    info!(
        repo = metadata.full_name,
        files = files.len(),
        "repository explored, inferring API surface"
    );

    let analysis = generator
        .analyze_repository(&metadata.full_name, &description, &files)
        .await?;
    debug!(
        repo = metadata.full_name,
        endpoints = analysis.endpoints.len(),
        "repository analysis complete"
    );

    Ok(NormalizedSource {
        name: analysis.name.unwrap_or(repo),
        description: analysis.description.unwrap_or(description),
        base_url: analysis.base_url,
        auth_method: analysis.auth_method,
        endpoints: analysis.endpoints,
        schemas: BTreeMap::new(),
        prebuilt: None,
    })
}
