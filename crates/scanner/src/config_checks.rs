//! Missing-configuration heuristics.
//!
//! Unlike the line-pattern detectors these need a whole-bundle view: "routes
//! with no rate limiting anywhere" is a property of the project, not of a
//! line.

use crate::report::{IssueKind, SecurityIssue, Severity};
use crate::scan::is_code_file;
use regex::Regex;
use std::sync::LazyLock;
use toolforge_types::ProjectFiles;

static CORS_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bcors\(\s*\)").unwrap());
static ORIGIN_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Access-Control-Allow-Origin.{0,5}['"]\*['"]"#).unwrap());
static ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:app|router)\.(?:get|post|put|delete|patch|all|use)\s*\(").unwrap()
});
static RATE_LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)rate[-_]?limit").unwrap());
static REQ_DATA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"req\.(?:body|query)\b").unwrap());
static VALIDATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)validat|\b(?:zod|joi|ajv)\b|schema\.parse|safeParse").unwrap()
});
static PLAIN_HTTP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\.createServer\s*\(").unwrap());

pub(crate) fn detect(files: &ProjectFiles) -> Vec<SecurityIssue> {
    let mut issues = Vec::new();
    let mut has_routes = false;
    let mut has_rate_limiting = false;
    let mut has_validation = false;
    let mut first_req_data: Option<(String, u32)> = None;

    for (path, content) in files.iter().filter(|(p, _)| is_code_file(p)) {
        for (idx, line) in content.lines().enumerate() {
            let line_no = (idx + 1) as u32;

            if CORS_OPEN_RE.is_match(line) || ORIGIN_STAR_RE.is_match(line) {
                issues.push(
                    SecurityIssue::new(
                        IssueKind::Vulnerability,
                        Severity::Medium,
                        format!("permissive cross-origin configuration in {path}"),
                    )
                    .at(path, line_no)
                    .with_fix("Restrict CORS to an explicit origin allow-list"),
                );
            }

            if PLAIN_HTTP_RE.is_match(line) {
                issues.push(
                    SecurityIssue::new(
                        IssueKind::Vulnerability,
                        Severity::High,
                        format!("plain (non-TLS) HTTP server constructor in {path}"),
                    )
                    .at(path, line_no)
                    .with_fix("Serve behind the platform's HTTPS ingress instead"),
                );
            }

            has_routes |= ROUTE_RE.is_match(line);
            has_rate_limiting |= RATE_LIMIT_RE.is_match(line);
            has_validation |= VALIDATION_RE.is_match(line);
            if first_req_data.is_none() && REQ_DATA_RE.is_match(line) {
                first_req_data = Some((path.to_string(), line_no));
            }
        }
    }

    if has_routes && !has_rate_limiting {
        issues.push(
            SecurityIssue::new(
                IssueKind::Vulnerability,
                Severity::Low,
                "HTTP route handlers with no rate-limiting indicator",
            )
            .with_fix("Add a rate-limiting middleware in front of the routes"),
        );
    }

    if let Some((path, line)) = first_req_data
        && !has_validation
    {
        issues.push(
            SecurityIssue::new(
                IssueKind::Vulnerability,
                Severity::Medium,
                format!("request data used without any validation step, first in {path}"),
            )
            .at(&path, line)
            .with_fix("Validate request bodies and query parameters against a schema"),
        );
    }

    issues
}
