//! Code-host client for the repository input variant.
//!
//! Speaks the tree-browsing API: repository metadata, directory listings,
//! raw-content downloads. The API base URL is injectable so tests can point
//! it at a mock; the optional bearer token only raises rate limits.

use crate::error::{Result, SourceError};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

static OWNER_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[:/]([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?(?:[/?#]|$)")
        .unwrap()
});

/// Parses `owner/repo` out of a repository URL.
///
/// # Errors
///
/// Returns [`SourceError::RepoFormat`] with a format hint when the URL does
/// not match.
pub fn parse_owner_repo(url: &str) -> Result<(String, String)> {
    OWNER_REPO_RE
        .captures(url)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .ok_or_else(|| SourceError::RepoFormat {
            url: url.to_string(),
        })
}

#[derive(Debug, Clone)]
pub struct CodeHostConfig {
    /// API origin, e.g. `https://api.github.com`.
    pub api_base: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for CodeHostConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token: None,
            timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoMetadata {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    /// `file` or `dir`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl TreeEntry {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == "dir"
    }
}

pub struct CodeHost {
    client: reqwest::Client,
    config: CodeHostConfig,
}

impl CodeHost {
    #[must_use]
    pub fn new(config: CodeHostConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent("toolforge")
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.get(url);
        if let Some(token) = &self.config.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base.trim_end_matches('/'))
    }

    /// Fetches repository metadata.
    ///
    /// # Errors
    ///
    /// [`SourceError::Fetch`] on transport failure,
    /// [`SourceError::FetchStatus`] on a non-2xx reply.
    pub async fn metadata(&self, owner: &str, repo: &str) -> Result<RepoMetadata> {
        let url = self.api_url(&format!("/repos/{owner}/{repo}"));
        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(&url, &e))?;
        if !response.status().is_success() {
            return Err(SourceError::FetchStatus {
                url,
                status: response.status().as_u16(),
            });
        }
        response.json().await.map_err(|e| SourceError::fetch(&url, &e))
    }

    /// Lists one directory of the repository tree. `path` is empty for the
    /// root.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::metadata`].
    pub async fn list_dir(&self, owner: &str, repo: &str, path: &str) -> Result<Vec<TreeEntry>> {
        let url = if path.is_empty() {
            self.api_url(&format!("/repos/{owner}/{repo}/contents"))
        } else {
            self.api_url(&format!("/repos/{owner}/{repo}/contents/{path}"))
        };
        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(&url, &e))?;
        if !response.status().is_success() {
            return Err(SourceError::FetchStatus {
                url,
                status: response.status().as_u16(),
            });
        }
        response.json().await.map_err(|e| SourceError::fetch(&url, &e))
    }

    /// Downloads raw file content, truncated at `max_bytes`.
    ///
    /// # Errors
    ///
    /// [`SourceError::Fetch`] on transport failure,
    /// [`SourceError::FetchStatus`] on a non-2xx reply.
    pub async fn download(&self, url: &str, max_bytes: usize) -> Result<String> {
        let response = self
            .request(url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(url, &e))?;
        if !response.status().is_success() {
            return Err(SourceError::FetchStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        toolforge_fetch::read_text_truncated(response, max_bytes)
            .await
            .map_err(|e| SourceError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_suffixed_repo_urls() {
        for url in [
            "https://github.com/acme/petstore",
            "https://github.com/acme/petstore.git",
            "https://github.com/acme/petstore/tree/main/src",
            "git@github.com:acme/petstore.git",
        ] {
            let (owner, repo) = parse_owner_repo(url).expect(url);
            assert_eq!(owner, "acme");
            assert_eq!(repo, "petstore");
        }
    }

    #[test]
    fn rejects_urls_without_owner_repo() {
        for url in ["https://github.com/acme", "https://example.com/acme/petstore"] {
            assert!(matches!(
                parse_owner_repo(url),
                Err(SourceError::RepoFormat { .. })
            ));
        }
    }
}
