//! Insecure-dependency detection over the project manifest.

use crate::report::{IssueKind, SecurityIssue, Severity};
use toolforge_types::PackageManifest;
use toolforge_types::project::MANIFEST_FILE;

/// Curated known-vulnerable name+version pairs. Small on purpose: this is a
/// deploy gate for generated code, not a vulnerability database.
const KNOWN_VULNERABLE: &[(&str, &str, Severity, &str)] = &[
    (
        "lodash",
        "4.17.20",
        Severity::High,
        "command injection (CVE-2021-23337); upgrade to 4.17.21",
    ),
    (
        "minimist",
        "1.2.5",
        Severity::High,
        "prototype pollution (CVE-2021-44906); upgrade to 1.2.6",
    ),
    (
        "node-fetch",
        "2.6.6",
        Severity::Medium,
        "cookie exposure on redirect (CVE-2022-0235); upgrade to 2.6.7",
    ),
    (
        "axios",
        "0.21.0",
        Severity::High,
        "SSRF via redirect (CVE-2020-28168); upgrade to 0.21.1",
    ),
    (
        "qs",
        "6.5.2",
        Severity::High,
        "prototype pollution (CVE-2022-24999); upgrade to 6.5.3",
    ),
];

pub(crate) fn detect(manifest_raw: &str) -> Vec<SecurityIssue> {
    // Malformed manifests fail soft: no dependencies, no findings.
    let Some(manifest) = PackageManifest::parse_lenient(manifest_raw) else {
        return Vec::new();
    };

    let mut issues = Vec::new();
    for (name, range, group) in manifest.all_dependencies() {
        let version = range.trim().trim_start_matches(['^', '~', '=']);

        if let Some((_, _, severity, note)) = KNOWN_VULNERABLE
            .iter()
            .find(|(n, v, _, _)| *n == name && *v == version)
        {
            issues.push(
                SecurityIssue::new(
                    IssueKind::InsecureDependency,
                    *severity,
                    format!("{name}@{version} in {}: {note}", group.as_str()),
                )
                .in_file(MANIFEST_FILE)
                .with_fix("Upgrade to a patched release"),
            );
        }

        if is_unpinned(range) {
            issues.push(
                SecurityIssue::new(
                    IssueKind::InsecureDependency,
                    Severity::Medium,
                    format!(
                        "{name} uses unpinned version range {range:?} in {}",
                        group.as_str()
                    ),
                )
                .in_file(MANIFEST_FILE)
                .with_fix("Pin to an exact version"),
            );
        }
    }
    issues
}

fn is_unpinned(range: &str) -> bool {
    let r = range.trim();
    if r.is_empty() || r == "*" || r.eq_ignore_ascii_case("latest") {
        return true;
    }
    if r.starts_with(['^', '~', '>', '<']) {
        return true;
    }
    if r.contains("||") || r.contains(" - ") {
        return true;
    }
    r.split('.').any(|seg| seg == "x" || seg == "X" || seg == "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vulnerable_pair_is_flagged_in_either_group() {
        let manifest = r#"{
            "dependencies": {"lodash": "4.17.20"},
            "devDependencies": {"minimist": "1.2.5"}
        }"#;
        let issues = detect(manifest);
        let known: Vec<_> = issues
            .iter()
            .filter(|i| i.message.contains("CVE"))
            .collect();
        assert_eq!(known.len(), 2);
        assert!(known.iter().any(|i| i.message.contains("dependencies")));
        assert!(known.iter().any(|i| i.message.contains("devDependencies")));
    }

    #[test]
    fn caret_range_still_matches_the_vulnerable_version() {
        let issues = detect(r#"{"dependencies": {"axios": "^0.21.0"}}"#);
        assert!(issues.iter().any(|i| i.message.contains("SSRF")));
    }

    #[test]
    fn wildcard_and_range_versions_are_medium() {
        let manifest = r#"{"dependencies": {"express": "*", "cors": "^2.8.5", "zod": "3.x"}}"#;
        let issues = detect(manifest);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.severity == Severity::Medium));
    }

    #[test]
    fn pinned_clean_manifest_yields_nothing() {
        let manifest = r#"{"dependencies": {"express": "4.19.2", "zod": "3.23.8"}}"#;
        assert!(detect(manifest).is_empty());
    }

    #[test]
    fn malformed_manifest_fails_soft() {
        assert!(detect("{ not json").is_empty());
    }
}
