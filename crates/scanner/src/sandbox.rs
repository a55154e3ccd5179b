//! Sandbox compliance: generated code may only import allow-listed modules.
//!
//! Relative imports are always fine. Filesystem access is governed by policy
//! rather than the allow-list, so a deployment target that permits it does
//! not need a different module list.

use crate::report::{IssueKind, SecurityIssue, Severity};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use toolforge_types::policy::SANDBOX_ALLOWED_MODULES;

static REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]"#).unwrap());
static IMPORT_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s+[^;]*?from\s+['"]([^'"]+)['"]"#).unwrap());
static IMPORT_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s+['"]([^'"]+)['"]"#).unwrap());
static IMPORT_DYNAMIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\(\s*['"]([^'"]+)['"]"#).unwrap());
static FS_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:readFileSync|writeFileSync|appendFileSync|createReadStream|createWriteStream)\s*\(|\bfs\.(?:readFile|writeFile|appendFile|unlink|rm|mkdir|readdir)\b",
    )
    .unwrap()
});

pub(crate) fn detect(path: &str, content: &str, allow_filesystem: bool) -> Vec<SecurityIssue> {
    let mut issues = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = (idx + 1) as u32;

        let mut seen: HashSet<&str> = HashSet::new();
        for regex in [
            &*REQUIRE_RE,
            &*IMPORT_FROM_RE,
            &*IMPORT_BARE_RE,
            &*IMPORT_DYNAMIC_RE,
        ] {
            for caps in regex.captures_iter(line) {
                let Some(spec) = caps.get(1) else { continue };
                if !seen.insert(spec.as_str()) {
                    continue;
                }
                let Some(package) = module_package(spec.as_str()) else {
                    continue;
                };

                if package == "fs" {
                    if !allow_filesystem {
                        issues.push(
                            SecurityIssue::new(
                                IssueKind::DangerousCode,
                                Severity::High,
                                format!("filesystem module imported in {path}"),
                            )
                            .at(path, line_no)
                            .with_fix("Filesystem access is disabled for generated servers"),
                        );
                    }
                    continue;
                }

                if !SANDBOX_ALLOWED_MODULES.contains(&package) {
                    issues.push(
                        SecurityIssue::new(
                            IssueKind::DangerousCode,
                            Severity::High,
                            format!("module {package:?} is outside the sandbox allow-list in {path}"),
                        )
                        .at(path, line_no)
                        .with_fix(format!(
                            "Import only from: {}",
                            SANDBOX_ALLOWED_MODULES.join(", ")
                        )),
                    );
                }
            }
        }

        if !allow_filesystem && FS_CALL_RE.is_match(line) {
            issues.push(
                SecurityIssue::new(
                    IssueKind::DangerousCode,
                    Severity::High,
                    format!("filesystem read/write call in {path}"),
                )
                .at(path, line_no)
                .with_fix("Filesystem access is disabled for generated servers"),
            );
        }
    }
    issues
}

/// Resolves an import spec to its package name, or `None` for relative and
/// local imports. `node:` prefixes are stripped; scoped packages keep their
/// scope.
fn module_package(spec: &str) -> Option<&str> {
    if spec.starts_with('.') || spec.starts_with('/') {
        return None;
    }
    let spec = spec.strip_prefix("node:").unwrap_or(spec);
    if spec.starts_with('@') {
        let mut slashes = spec.match_indices('/');
        slashes.next();
        return match slashes.next() {
            Some((i, _)) => Some(&spec[..i]),
            None => Some(spec),
        };
    }
    spec.split('/').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_listed_and_relative_imports_pass() {
        let code = "const axios = require('axios');\nimport { z } from 'zod';\nconst util = require('./util');\nimport crypto from 'node:crypto';\n";
        assert!(detect("index.js", code, false).is_empty());
    }

    #[test]
    fn off_list_module_is_high_and_names_the_list() {
        let code = "const pad = require('left-pad');\n";
        let issues = detect("index.js", code, false);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::High);
        assert!(issues[0].fix.as_deref().is_some_and(|f| f.contains("express")));
    }

    #[test]
    fn scoped_package_resolves_to_scope_and_name() {
        assert_eq!(module_package("@acme/sdk/deep"), Some("@acme/sdk"));
        assert_eq!(module_package("lodash/get"), Some("lodash"));
        assert_eq!(module_package("./local"), None);
    }

    #[test]
    fn fs_module_and_calls_follow_the_policy() {
        let code = "const fs = require('fs');\nconst data = fs.readFileSync('/etc/passwd');\n";
        let closed = detect("index.js", code, false);
        assert_eq!(closed.len(), 2);
        assert!(closed.iter().all(|i| i.severity == Severity::High));

        let open = detect("index.js", code, true);
        assert!(open.is_empty());
    }

    #[test]
    fn fs_promises_counts_as_filesystem() {
        let code = "import { readFile } from 'fs/promises';\n";
        let issues = detect("index.js", code, false);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("filesystem module"));
    }
}
