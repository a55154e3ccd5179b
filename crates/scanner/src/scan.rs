//! Detector composition and scoring.

use crate::report::{ScanResult, SecurityIssue};
use crate::{config_checks, credentials, dangerous, deps, sandbox};
use toolforge_types::ProjectFiles;
use toolforge_types::project::{HOST_CONFIG_FILE, MANIFEST_FILE, README_FILE};
use tracing::info;

/// Scan-time policy knobs.
#[derive(Debug, Clone, Default)]
pub struct ScanPolicy {
    /// Whether generated code may touch the filesystem.
    pub allow_filesystem: bool,
}

/// True for files holding executable code, as opposed to the manifest, host
/// configuration, and README. The credential detector ignores this split;
/// a leaked key in a README still ships.
pub(crate) fn is_code_file(path: &str) -> bool {
    path != MANIFEST_FILE && path != HOST_CONFIG_FILE && path != README_FILE
}

/// Runs every detector over the bundle and derives the verdict.
#[must_use]
pub fn scan_project(files: &ProjectFiles, policy: &ScanPolicy) -> ScanResult {
    let mut issues: Vec<SecurityIssue> = Vec::new();

    for (path, content) in files.iter() {
        issues.extend(credentials::detect(path, content));
        if is_code_file(path) {
            issues.extend(dangerous::detect(path, content));
            issues.extend(sandbox::detect(path, content, policy.allow_filesystem));
        }
    }

    if let Some(manifest) = files.manifest() {
        issues.extend(deps::detect(manifest));
    }

    issues.extend(config_checks::detect(files));

    let result = ScanResult::from_issues(issues);
    info!(
        score = result.score,
        passed = result.passed,
        issues = result.issues.len(),
        "security scan complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;

    /// A bundle that exercises no detector: validated input, rate limiting,
    /// pinned dependencies, allow-listed imports only.
    fn clean_project() -> ProjectFiles {
        let mut files = ProjectFiles::new();
        files.insert(
            "index.js",
            concat!(
                "const express = require('express');\n",
                "const { z } = require('zod');\n",
                "const app = express();\n",
                "const limiter = rateLimitWindow(60);\n",
                "app.use(limiter);\n",
                "const itemSchema = z.object({ name: z.string() });\n",
                "app.post('/items', (req, res) => {\n",
                "  const item = itemSchema.parse(req.body);\n",
                "  res.json(item);\n",
                "});\n",
                "module.exports = app;\n",
            ),
        );
        files.insert(
            "package.json",
            r#"{"name": "items", "dependencies": {"express": "4.19.2", "zod": "3.23.8"}}"#,
        );
        files.insert("vercel.json", r#"{"routes": [{"src": "/.*", "dest": "index.js"}]}"#);
        files.insert("README.md", "# items\n");
        files
    }

    #[test]
    fn clean_bundle_scores_100_and_passes() {
        let result = scan_project(&clean_project(), &ScanPolicy::default());
        assert_eq!(result.score, 100, "issues: {:?}", result.issues);
        assert!(result.passed);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn hardcoded_credential_fails_the_gate() {
        let mut files = clean_project();
        files.insert(
            "config.js",
            "const apiKey = \"sk-abcdef1234567890\";\nmodule.exports = { apiKey };\n",
        );
        let result = scan_project(&files, &ScanPolicy::default());
        assert!(!result.passed);
        assert_eq!(result.count(Severity::Critical), 1);
        assert_eq!(result.score, 60);
    }

    #[test]
    fn scan_covers_every_detector_family() {
        let mut files = ProjectFiles::new();
        files.insert(
            "index.js",
            concat!(
                "const out = eval(input);\n",
                "const pad = require('left-pad');\n",
                "app.get('/x', (req, res) => res.send(req.query.q));\n",
            ),
        );
        files.insert("package.json", r#"{"dependencies": {"lodash": "4.17.20"}}"#);
        let result = scan_project(&files, &ScanPolicy::default());

        use crate::report::IssueKind;
        let kinds: std::collections::HashSet<_> =
            result.issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::DangerousCode));
        assert!(kinds.contains(&IssueKind::InsecureDependency));
        assert!(kinds.contains(&IssueKind::Vulnerability));
        assert!(!result.passed);
    }
}
