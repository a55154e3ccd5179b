//! Tool definitions exposed by a generated server.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One callable tool: a name, a sentence of description, and a JSON Schema
/// for its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the tool's arguments. Defaults to an empty object
    /// schema when the generator omits it.
    #[serde(default = "default_schema")]
    pub schema: Value,
}

fn default_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

impl ToolDef {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: default_schema(),
        }
    }
}

/// Joins a server slug and a tool name into the fully qualified name used in
/// listings, `{server}/{tool}`.
#[must_use]
pub fn qualified_tool_name(server: &str, tool: &str) -> String {
    format!("{server}/{tool}")
}

/// Splits a fully qualified tool name back into `(server, tool)`.
///
/// Returns `None` when the separator is missing or either side is empty.
#[must_use]
pub fn split_qualified(qualified: &str) -> Option<(&str, &str)> {
    let (server, tool) = qualified.split_once('/')?;
    if server.is_empty() || tool.is_empty() {
        return None;
    }
    Some((server, tool))
}
