//! Source normalization for toolforge.
//!
//! Three input kinds, one output contract: specification documents
//! ([`spec`]), documentation pages ([`docs`]), and repositories
//! ([`repo`] + [`explorer`]) all converge on
//! [`toolforge_types::NormalizedSource`] before code generation, so
//! downstream stages never branch on input kind.

pub mod docs;
pub mod error;
pub mod explorer;
pub mod github;
pub mod repo;
pub mod spec;

pub use error::{Result, SourceError};
pub use explorer::{ExplorerConfig, SOURCE_EXTENSIONS, SPEC_FILENAMES};
pub use github::{CodeHost, CodeHostConfig, parse_owner_repo};

use std::sync::Arc;
use std::time::Duration;
use toolforge_codegen::CodeGenerator;
use toolforge_types::{NormalizedSource, SourceDescriptor};
use tracing::info;

/// Entry point for the normalization stage.
pub struct SourceNormalizer {
    http: reqwest::Client,
    generator: Arc<CodeGenerator>,
    code_host: CodeHost,
    explorer: ExplorerConfig,
}

impl SourceNormalizer {
    #[must_use]
    pub fn new(
        generator: Arc<CodeGenerator>,
        code_host: CodeHost,
        explorer: ExplorerConfig,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("toolforge")
            .build()
            .unwrap_or_default();
        Self {
            http,
            generator,
            code_host,
            explorer,
        }
    }

    /// Normalizes one source descriptor into the common shape.
    ///
    /// # Errors
    ///
    /// [`SourceError::InvalidUrl`] before any network call for malformed
    /// URLs; variant-specific errors per [`spec`], [`docs`], and [`repo`].
    pub async fn normalize(&self, descriptor: &SourceDescriptor) -> Result<NormalizedSource> {
        validate_url(descriptor.url())?;
        info!(kind = %descriptor.kind(), url = descriptor.url(), "normalizing source");

        match descriptor {
            SourceDescriptor::Spec { url } => spec::normalize_spec(&self.http, url).await,
            SourceDescriptor::Docs { url } => {
                docs::normalize_docs(&self.http, &self.generator, url).await
            }
            SourceDescriptor::Repo { url } => {
                repo::normalize_repo(&self.code_host, &self.generator, self.explorer.clone(), url)
                    .await
            }
        }
    }
}

fn validate_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw).map_err(|e| SourceError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SourceError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {:?}", parsed.scheme()),
        });
    }
    Ok(())
}
