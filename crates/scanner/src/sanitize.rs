//! Line-preserving sanitization of critical findings.

use crate::report::{ScanResult, Severity};
use std::collections::{BTreeMap, BTreeSet};
use toolforge_types::ProjectFiles;

/// What a redacted line becomes.
pub const REDACTION_MARKER: &str = "/* removed by security scan */";

/// Replaces the content of every line carrying a critical issue.
///
/// Lines are never inserted or deleted, so line numbers reported by the
/// remaining (non-critical) issues stay valid on the sanitized bundle.
#[must_use]
pub fn sanitize_project(files: &ProjectFiles, result: &ScanResult) -> ProjectFiles {
    let mut targets: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    for issue in &result.issues {
        if issue.severity == Severity::Critical
            && let (Some(file), Some(line)) = (issue.file.as_deref(), issue.line)
        {
            targets.entry(file).or_default().insert(line);
        }
    }

    let mut out = ProjectFiles::new();
    for (path, content) in files.iter() {
        match targets.get(path) {
            Some(lines) => out.insert(path, redact_lines(content, lines)),
            None => out.insert(path, content),
        }
    }
    out
}

fn redact_lines(content: &str, lines: &BTreeSet<u32>) -> String {
    let mut redacted: Vec<&str> = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if lines.contains(&((idx + 1) as u32)) {
            redacted.push(REDACTION_MARKER);
        } else {
            redacted.push(line);
        }
    }
    let mut joined = redacted.join("\n");
    if content.ends_with('\n') {
        joined.push('\n');
    }
    joined
}
