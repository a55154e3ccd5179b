//! Documentation-page normalization.
//!
//! Endpoint extraction from prose cannot be done by fixed rules, so the page
//! is handed to the model service. The analysis reply also carries the
//! generated code and tools; they ride along as `prebuilt` so the docs
//! variant costs exactly one model round trip.

use crate::error::{Result, SourceError};
use std::collections::BTreeMap;
use toolforge_codegen::CodeGenerator;
use toolforge_types::NormalizedSource;
use tracing::debug;

/// Cap on fetched documentation pages; the prompt truncates further.
pub const DOCS_PAGE_LIMIT: usize = 512 * 1024;

/// Fetches a documentation page and normalizes it through the model service.
///
/// # Errors
///
/// [`SourceError::Fetch`]/[`SourceError::FetchStatus`] for page fetch
/// failures; model contract/transport errors propagate via
/// [`SourceError::Codegen`].
pub async fn normalize_docs(
    client: &reqwest::Client,
    generator: &CodeGenerator,
    url: &str,
) -> Result<NormalizedSource> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::fetch(url, &e))?;
    if !response.status().is_success() {
        return Err(SourceError::FetchStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    let page = toolforge_fetch::read_text_truncated(response, DOCS_PAGE_LIMIT)
        .await
        .map_err(|e| SourceError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let analysis = generator.analyze_documentation(&page).await?;
    debug!(
        url,
        endpoints = analysis.endpoints.len(),
        prebuilt = analysis.prebuilt.is_some(),
        "documentation analyzed"
    );

    Ok(NormalizedSource {
        name: analysis.name.unwrap_or_else(|| fallback_name(url)),
        description: analysis.description.unwrap_or_default(),
        base_url: analysis.base_url,
        auth_method: analysis.auth_method,
        endpoints: analysis.endpoints,
        schemas: BTreeMap::new(),
        prebuilt: analysis.prebuilt,
    })
}

/// Host-derived name when the model returns none.
fn fallback_name(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "Documented API".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_name_uses_the_page_host() {
        assert_eq!(fallback_name("https://docs.example.com/api"), "docs.example.com");
        assert_eq!(fallback_name("not a url"), "Documented API");
    }
}
