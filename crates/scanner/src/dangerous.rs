//! Dangerous-code detection: dynamic execution, shell-outs, HTML injection
//! sinks, and string-built SQL.

use crate::report::{IssueKind, SecurityIssue, Severity};
use regex::Regex;
use std::sync::LazyLock;

struct Pattern {
    regex: Regex,
    severity: Severity,
    what: &'static str,
    fix: Option<&'static str>,
}

static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    let table: &[(&str, Severity, &str, Option<&str>)] = &[
        (
            r"\beval\s*\(",
            Severity::Critical,
            "dynamic code execution via eval",
            Some("Remove eval and compute the value explicitly"),
        ),
        (
            r"new\s+Function\s*\(",
            Severity::High,
            "dynamic function construction",
            Some("Replace new Function with a static implementation"),
        ),
        (
            r"\bchild_process\b",
            Severity::High,
            "shell/process execution via child_process",
            None,
        ),
        (
            r"\b(?:execSync|spawnSync)\s*\(",
            Severity::High,
            "synchronous shell execution",
            None,
        ),
        (
            r"\.innerHTML\s*=",
            Severity::High,
            "unsanitized HTML injection via innerHTML",
            Some("Escape or sanitize the value before rendering"),
        ),
        (
            r"document\.write\s*\(",
            Severity::High,
            "unsanitized document.write",
            None,
        ),
        (
            r"dangerouslySetInnerHTML",
            Severity::Medium,
            "raw HTML injection hook",
            None,
        ),
        (
            r"(?i)\b(?:select|insert|update|delete|drop)\b[^\n]*\$\{",
            Severity::Critical,
            "request data interpolated into a SQL string",
            Some("Use parameterized queries"),
        ),
        (
            r#"(?i)\b(?:select|insert|update|delete|drop)\b[^\n]*["']\s*\+"#,
            Severity::High,
            "SQL string built by concatenation",
            Some("Use parameterized queries"),
        ),
    ];

    table
        .iter()
        .map(|(pattern, severity, what, fix)| Pattern {
            regex: Regex::new(pattern).unwrap(),
            severity: *severity,
            what,
            fix: *fix,
        })
        .collect()
});

pub(crate) fn detect(path: &str, content: &str) -> Vec<SecurityIssue> {
    let mut issues = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for pattern in PATTERNS.iter() {
            if pattern.regex.is_match(line) {
                let mut issue = SecurityIssue::new(
                    IssueKind::DangerousCode,
                    pattern.severity,
                    format!("{} in {path}", pattern.what),
                )
                .at(path, (idx + 1) as u32);
                if let Some(fix) = pattern.fix {
                    issue = issue.with_fix(fix);
                }
                issues.push(issue);
                break;
            }
        }
    }
    issues
}
