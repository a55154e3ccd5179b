//! JSON extraction from free-form model replies.
//!
//! The contract says "reply with a single JSON object", but real replies come
//! wrapped in code fences, prefixed with prose, or both. Strategies run in
//! order; each is attempted only when the previous one fails to parse.

use crate::error::{CodegenError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// How much of an unparseable reply to echo into the error.
const SNIPPET_CHARS: usize = 100;

static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:[\w-]+)?\s*(.*?)```").unwrap());
static OBJECT_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());
static ANY_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)[\[{].*[\]}]").unwrap());

/// Pulls the first parseable JSON value out of a model reply.
///
/// # Errors
///
/// Returns [`CodegenError::Contract`] with the first 100 characters of the
/// reply when no strategy yields valid JSON.
pub fn extract_json(raw: &str) -> Result<Value> {
    // Fenced code block, with or without a language tag.
    if let Some(caps) = FENCED_BLOCK_RE.captures(raw)
        && let Some(inner) = caps.get(1)
        && let Ok(v) = serde_json::from_str::<Value>(inner.as_str().trim())
    {
        return Ok(v);
    }

    // The whole reply as-is.
    if let Ok(v) = serde_json::from_str::<Value>(raw.trim()) {
        return Ok(v);
    }

    // Greedy span from the first `{` to the last `}`.
    if let Some(m) = OBJECT_SPAN_RE.find(raw)
        && let Ok(v) = serde_json::from_str::<Value>(m.as_str())
    {
        return Ok(v);
    }

    // Generic object-or-array span.
    if let Some(m) = ANY_SPAN_RE.find(raw)
        && let Ok(v) = serde_json::from_str::<Value>(m.as_str())
    {
        return Ok(v);
    }

    Err(contract_error(raw))
}

/// Builds the contract-violation error for a reply, echoing its first 100
/// characters.
pub(crate) fn contract_error(raw: &str) -> CodegenError {
    CodegenError::Contract {
        snippet: raw.chars().take(SNIPPET_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_prose_wrapped_and_clean_replies_parse_identically() {
        let expected = json!({"code": "module.exports = {}", "tools": []});

        let clean = r#"{"code": "module.exports = {}", "tools": []}"#;
        let fenced = "```json\n{\"code\": \"module.exports = {}\", \"tools\": []}\n```";
        let fenced_untagged = "```\n{\"code\": \"module.exports = {}\", \"tools\": []}\n```";
        let with_prose =
            "Here is the generated server:\n{\"code\": \"module.exports = {}\", \"tools\": []}";

        for reply in [clean, fenced, fenced_untagged, with_prose] {
            assert_eq!(extract_json(reply).expect("parse"), expected, "reply: {reply}");
        }
    }

    #[test]
    fn array_reply_parses_via_generic_span() {
        let v = extract_json("endpoints found: [1, 2, 3] (done)").expect("parse");
        assert_eq!(v, json!([1, 2, 3]));
    }

    #[test]
    fn reply_without_json_reports_first_100_chars() {
        let long = "no json here ".repeat(20);
        let err = extract_json(&long).unwrap_err();
        match err {
            CodegenError::Contract { snippet } => {
                assert_eq!(snippet.chars().count(), 100);
                assert!(long.starts_with(&snippet));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unbalanced_braces_still_fail_the_contract() {
        let err = extract_json("{\"code\": \"truncated").unwrap_err();
        assert!(matches!(err, CodegenError::Contract { .. }));
    }
}
