//! Instruction templates for the model service.
//!
//! Each pipeline stage that talks to the model builds exactly one prompt
//! here: a fixed instruction block plus a serialized form of the stage's
//! input. The reply contract for every JSON-producing template is parsed by
//! [`crate::extract`].

use serde::{Deserialize, Serialize};
use toolforge_types::policy::{SANDBOX_ALLOWED_MODULES, SHARED_SECRET_ENV, SHARED_SECRET_HEADER};
use toolforge_types::{NormalizedSource, SourceKind, ToolDef, slugify};

/// Documentation pages are truncated to this many characters before
/// submission.
pub const DOC_TEXT_LIMIT: usize = 15_000;

/// One file selected by repository exploration, as handed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

/// Shared description of the project bundle every generation reply must
/// produce.
fn project_requirements(slug: &str) -> String {
    format!(
        r#"The generated project is a Node.js tool server with exactly these files:
- package.json: name "{slug}", version, dependencies. Pin every dependency to an exact version.
- vercel.json: routes every path to index.js.
- index.js: an Express app, exported as the module's handler. POST / accepts a JSON-RPC envelope {{"jsonrpc": "2.0", "method": ..., "params": ..., "id": ...}} with methods initialize, initialized, ping, tools/list, and tools/call. GET /tools/list and POST /tools/call are REST fallbacks for the same operations. GET /health responds {{"ok": true}}. tools/list, tools/call, and both REST fallbacks must reject requests whose "{header}" header does not equal process.env.{env}. Tool names in responses are namespaced "{slug}/<tool>".
- README.md: what the server does and how to call each tool.

Rules:
- Import only from this allow-list (relative imports are fine): {modules}.
- Never hardcode credentials; read every secret from process.env.
- Validate request parameters before using them."#,
        slug = slug,
        header = SHARED_SECRET_HEADER,
        env = SHARED_SECRET_ENV,
        modules = SANDBOX_ALLOWED_MODULES.join(", "),
    )
}

const GENERATION_REPLY_CONTRACT: &str = r#"Reply with a single JSON object and nothing else:
{"code": {"package.json": "...", "vercel.json": "...", "index.js": "...", "README.md": "..."}, "tools": [{"name": "...", "description": "...", "schema": {"type": "object", "properties": {...}}}]}
"tools" holds one entry per upstream operation, with unqualified names and a JSON Schema for the arguments."#;

/// Builds the generation prompt for a normalized source.
///
/// The instruction block differs per input kind; the serialized source and
/// the reply contract are shared.
#[must_use]
pub fn generation_prompt(source: &NormalizedSource, kind: SourceKind) -> String {
    let intro = match kind {
        SourceKind::Spec => {
            "You build tool servers from API specifications. Generate a complete Node.js tool server for the API described by this normalized specification."
        }
        SourceKind::Docs => {
            "You build tool servers from API documentation. Generate a complete Node.js tool server for the API surface extracted from the documentation below."
        }
        SourceKind::Repo => {
            "You build tool servers from repository analysis. Generate a complete Node.js tool server for the API surface inferred from the repository below."
        }
    };

    let serialized =
        serde_json::to_string_pretty(source).unwrap_or_else(|_| "{}".to_string());
    let slug = slugify(&source.name);

    format!(
        "{intro}\n\n{requirements}\n\n{contract}\n\nNormalized source:\n{serialized}",
        requirements = project_requirements(&slug),
        contract = GENERATION_REPLY_CONTRACT,
    )
}

/// Builds the documentation-analysis prompt.
///
/// One round trip covers both analysis and generation: the reply carries the
/// API surface *and* the generated project, so the docs variant never pays a
/// second model call.
#[must_use]
pub fn docs_analysis_prompt(page_text: &str) -> String {
    let truncated = truncate_chars(page_text, DOC_TEXT_LIMIT);
    format!(
        r#"You extract HTTP API surfaces from documentation pages and generate tool servers for them.

Read the documentation below and reply with a single JSON object and nothing else:
{{"name": "...", "description": "...", "baseUrl": "...", "authMethod": "none|bearer|api_key|basic", "endpoints": [{{"path": "...", "method": "...", "summary": "...", "parameters": [{{"name": "...", "in": "query|path|header|body", "required": true}}]}}], "code": {{...}}, "tools": [...]}}

"code" and "tools" follow the generation contract: {contract}

{requirements}

Documentation:
{truncated}"#,
        contract = GENERATION_REPLY_CONTRACT,
        requirements = project_requirements("the API's slug (derive it from the name)"),
    )
}

/// Builds the repository-analysis prompt over the explored file set.
#[must_use]
pub fn repo_analysis_prompt(repo: &str, description: &str, files: &[SourceFile]) -> String {
    let mut excerpt = String::new();
    for file in files {
        excerpt.push_str(&format!("--- {} ---\n{}\n\n", file.path, file.content));
    }

    format!(
        r#"You infer HTTP API surfaces from source code.

Below are selected files from the repository "{repo}" ({description}). Infer the API the repository serves and reply with a single JSON object and nothing else:
{{"name": "...", "description": "...", "baseUrl": "...", "authMethod": "none|bearer|api_key|basic", "endpoints": [{{"path": "...", "method": "...", "summary": "...", "parameters": [...]}}]}}

Use null for baseUrl if the code never names a public host. List every route you can identify.

Files:
{excerpt}"#,
    )
}

/// Builds the post-deploy documentation prompt. The reply is free-form
/// Markdown, not JSON.
#[must_use]
pub fn server_docs_prompt(name: &str, description: &str, tools: &[ToolDef]) -> String {
    let tool_list = serde_json::to_string_pretty(tools).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"Write user-facing Markdown documentation for the deployed tool server "{name}" ({description}).

Cover: what the server does, one section per tool with its arguments and an example call, and how callers authenticate. Reply with Markdown only.

Tools:
{tool_list}"#,
    )
}

/// Truncates on a character boundary, never mid-codepoint.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
