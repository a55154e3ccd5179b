//! Source descriptors and the normalized API surface.
//!
//! The three input kinds (spec document, documentation page, repository) are a
//! closed union; every variant normalizes into the single [`NormalizedSource`]
//! shape before code generation, so downstream stages never branch on input
//! kind.

use crate::tool::ToolDef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One of the three supported input kinds, with its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// Machine-readable API specification document (JSON or YAML), by URL.
    Spec { url: String },
    /// Human-oriented documentation page, by URL.
    Docs { url: String },
    /// Source repository URL (`https://…/{owner}/{repo}`).
    Repo { url: String },
}

impl SourceDescriptor {
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Spec { .. } => SourceKind::Spec,
            Self::Docs { .. } => SourceKind::Docs,
            Self::Repo { .. } => SourceKind::Repo,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Spec { url } | Self::Docs { url } | Self::Repo { url } => url,
        }
    }
}

/// Input kind tag, persisted on the server record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Spec,
    Docs,
    Repo,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spec => "spec",
            Self::Docs => "docs",
            Self::Repo => "repo",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the upstream API authenticates callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    None,
    Bearer,
    ApiKey,
    Basic,
    Unknown,
}

impl AuthMethod {
    /// Lenient parse of free-form auth descriptions (model replies, specs).
    #[must_use]
    pub fn parse_loose(value: &str) -> Self {
        let v = value.trim().to_ascii_lowercase();
        match v.as_str() {
            "" | "none" | "open" => Self::None,
            "bearer" | "token" | "bearer_token" | "oauth" | "oauth2" => Self::Bearer,
            "apikey" | "api_key" | "api-key" | "key" => Self::ApiKey,
            "basic" => Self::Basic,
            _ => Self::Unknown,
        }
    }
}

/// One operation of the upstream API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub path: String,
    /// Lowercase HTTP method.
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<EndpointParameter>,
    /// Request body shape hint (schema-ish JSON, not validated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Success response shape hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_hint: Option<Value>,
}

/// One parameter of an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointParameter {
    pub name: String,
    /// Where the parameter goes: `path`, `query`, `header`, or `body`.
    #[serde(rename = "in", default)]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Code and tools returned by the documentation-analysis reply, carried so the
/// docs variant costs exactly one model round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltGeneration {
    /// Serialized project bundle, exactly as the model returned it.
    pub code: String,
    pub tools: Vec<ToolDef>,
}

/// The single shape every normalizer variant converges on before code
/// generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSource {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub auth_method: AuthMethod,
    pub endpoints: Vec<Endpoint>,
    /// Named schema definitions extracted from spec documents.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prebuilt: Option<PrebuiltGeneration>,
}
