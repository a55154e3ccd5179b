//! Generation and analysis calls against the model service.
//!
//! [`CodeGenerator`] owns every model interaction in the pipeline: project
//! generation from a normalized source, documentation and repository
//! analysis during normalization, and post-deploy documentation writing.
//! Re-running generation can produce different code for the same input; the
//! caller owns making that harmless (archive, then replace).

use crate::client::ModelClient;
use crate::error::Result;
use crate::extract::{contract_error, extract_json};
use crate::prompts::{self, SourceFile};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use toolforge_types::{
    AuthMethod, Endpoint, NormalizedSource, PrebuiltGeneration, ProjectFiles, SourceKind, ToolDef,
};
use tracing::{debug, info};

/// The parsed generation contract: the project bundle plus its tools.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub files: ProjectFiles,
    pub tools: Vec<ToolDef>,
}

/// API surface extracted from a documentation page, with the generation
/// piggybacked on the same reply.
#[derive(Debug, Clone)]
pub struct DocsAnalysis {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub auth_method: AuthMethod,
    pub endpoints: Vec<Endpoint>,
    pub prebuilt: Option<PrebuiltGeneration>,
}

/// API surface inferred from an explored repository file set.
#[derive(Debug, Clone)]
pub struct RepoAnalysis {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub auth_method: AuthMethod,
    pub endpoints: Vec<Endpoint>,
}

pub struct CodeGenerator {
    model: Arc<dyn ModelClient>,
}

#[derive(Debug, Deserialize)]
struct GenerationReply {
    code: Value,
    tools: Vec<ToolDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReply {
    name: Option<String>,
    description: Option<String>,
    base_url: Option<String>,
    auth_method: Option<String>,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
    code: Option<Value>,
    #[serde(default)]
    tools: Vec<ToolDef>,
}

impl CodeGenerator {
    #[must_use]
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    /// Generates the project bundle for a normalized source.
    ///
    /// When the source carries a prebuilt generation (docs variant), that is
    /// used as-is and no model call is made.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CodegenError::Contract`] when the reply cannot be
    /// parsed into `{code, tools}`, or a transport/service/timeout error from
    /// the model call.
    pub async fn generate(
        &self,
        source: &NormalizedSource,
        kind: SourceKind,
    ) -> Result<GenerationOutput> {
        if let Some(prebuilt) = &source.prebuilt {
            debug!(name = %source.name, "using prebuilt generation from documentation analysis");
            return Ok(GenerationOutput {
                files: ProjectFiles::from_code_field(&prebuilt.code),
                tools: prebuilt.tools.clone(),
            });
        }

        info!(
            name = %source.name,
            kind = %kind,
            endpoints = source.endpoints.len(),
            "generating server code"
        );

        let prompt = prompts::generation_prompt(source, kind);
        let raw = self.model.complete(&prompt).await?;
        let value = extract_json(&raw)?;
        let reply: GenerationReply =
            serde_json::from_value(value).map_err(|_| contract_error(&raw))?;

        let files = files_from_code_value(&reply.code);
        if files.is_empty() {
            return Err(contract_error(&raw));
        }

        Ok(GenerationOutput {
            files,
            tools: reply.tools,
        })
    }

    /// Asks the model to read a documentation page and return both the API
    /// surface and a generated project, in one round trip.
    ///
    /// # Errors
    ///
    /// Contract, transport, service, or timeout errors as for
    /// [`Self::generate`].
    pub async fn analyze_documentation(&self, page_text: &str) -> Result<DocsAnalysis> {
        let prompt = prompts::docs_analysis_prompt(page_text);
        let raw = self.model.complete(&prompt).await?;
        let value = extract_json(&raw)?;
        let reply: AnalysisReply =
            serde_json::from_value(value).map_err(|_| contract_error(&raw))?;

        let prebuilt = reply.code.map(|code| PrebuiltGeneration {
            code: code_value_to_string(&code),
            tools: reply.tools.clone(),
        });

        Ok(DocsAnalysis {
            name: reply.name,
            description: reply.description,
            base_url: reply.base_url,
            auth_method: parse_auth(reply.auth_method.as_deref()),
            endpoints: normalize_endpoints(reply.endpoints),
            prebuilt,
        })
    }

    /// Asks the model to infer the API surface from an explored file set.
    ///
    /// # Errors
    ///
    /// Contract, transport, service, or timeout errors as for
    /// [`Self::generate`].
    pub async fn analyze_repository(
        &self,
        repo: &str,
        description: &str,
        files: &[SourceFile],
    ) -> Result<RepoAnalysis> {
        let prompt = prompts::repo_analysis_prompt(repo, description, files);
        let raw = self.model.complete(&prompt).await?;
        let value = extract_json(&raw)?;
        let reply: AnalysisReply =
            serde_json::from_value(value).map_err(|_| contract_error(&raw))?;

        Ok(RepoAnalysis {
            name: reply.name,
            description: reply.description,
            base_url: reply.base_url,
            auth_method: parse_auth(reply.auth_method.as_deref()),
            endpoints: normalize_endpoints(reply.endpoints),
        })
    }

    /// Writes user-facing Markdown documentation for a deployed server. The
    /// reply is free text; no contract parsing applies.
    ///
    /// # Errors
    ///
    /// Transport, service, or timeout errors from the model call.
    pub async fn write_server_docs(
        &self,
        name: &str,
        description: &str,
        tools: &[ToolDef],
    ) -> Result<String> {
        let prompt = prompts::server_docs_prompt(name, description, tools);
        let raw = self.model.complete(&prompt).await?;
        Ok(raw.trim().to_string())
    }
}

/// The contract's `code` field is a serialized bundle: either a JSON object
/// of path to content, or a bare string holding the entry point.
fn files_from_code_value(code: &Value) -> ProjectFiles {
    match code {
        Value::String(s) => ProjectFiles::from_code_field(s),
        Value::Object(map) => map
            .iter()
            .map(|(path, content)| {
                let content = match content {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (path.clone(), content)
            })
            .collect(),
        other => ProjectFiles::from_code_field(&other.to_string()),
    }
}

fn code_value_to_string(code: &Value) -> String {
    match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_auth(raw: Option<&str>) -> AuthMethod {
    raw.map(AuthMethod::parse_loose).unwrap_or_default()
}

fn normalize_endpoints(mut endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    for endpoint in &mut endpoints {
        endpoint.method = endpoint.method.to_ascii_lowercase();
        if !endpoint.path.starts_with('/') {
            endpoint.path = format!("/{}", endpoint.path);
        }
    }
    endpoints
}
