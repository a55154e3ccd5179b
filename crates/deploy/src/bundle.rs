//! Deployment bundle assembly.
//!
//! Turns a project bundle plus its environment into the file payloads the
//! platform accepts: base64 content, sha256 digest, host configuration
//! filled in when the generator left it out.

use crate::client::{DeploymentRequest, FilePayload};
use crate::error::{DeployError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use toolforge_types::ProjectFiles;
use toolforge_types::project::HOST_CONFIG_FILE;

/// Host configuration used when the generated project carries none: every
/// path routes to the entry point.
pub const DEFAULT_HOST_CONFIG: &str = r#"{
  "version": 2,
  "routes": [{ "src": "/.*", "dest": "index.js" }]
}
"#;

/// Builds the deployment request for one project bundle.
///
/// # Errors
///
/// Returns [`DeployError::Bundle`] when the bundle has no files to deploy.
pub fn build_request(
    slug: &str,
    files: &ProjectFiles,
    env: &BTreeMap<String, String>,
) -> Result<DeploymentRequest> {
    if files.is_empty() {
        return Err(DeployError::Bundle("project bundle is empty".to_string()));
    }

    let mut payloads: Vec<FilePayload> = files
        .iter()
        .map(|(path, content)| payload(path, content))
        .collect();

    if files.host_config().is_none() {
        payloads.push(payload(HOST_CONFIG_FILE, DEFAULT_HOST_CONFIG));
        payloads.sort_by(|a, b| a.file.cmp(&b.file));
    }

    Ok(DeploymentRequest {
        name: slug.to_string(),
        files: payloads,
        target: "production",
        env: env.clone(),
    })
}

fn payload(path: &str, content: &str) -> FilePayload {
    FilePayload {
        file: path.to_string(),
        data: BASE64.encode(content.as_bytes()),
        sha: hex::encode(Sha256::digest(content.as_bytes())),
        encoding: "base64",
    }
}
