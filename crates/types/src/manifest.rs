//! Package manifest parsing.
//!
//! The generated project targets a single packaging format, so its manifest is
//! a `package.json`. Parsing is deliberately lenient: the scanner treats a
//! malformed manifest as "no dependencies", never as a scan failure.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Dependency group a manifest entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyGroup {
    Runtime,
    Development,
}

impl DependencyGroup {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "dependencies",
            Self::Development => "devDependencies",
        }
    }
}

/// Parsed build/runtime descriptor of a generated project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Parse a manifest, returning `None` for malformed JSON.
    #[must_use]
    pub fn parse_lenient(content: &str) -> Option<Self> {
        serde_json::from_str(content).ok()
    }

    /// All declared dependencies, runtime group first.
    pub fn all_dependencies(&self) -> impl Iterator<Item = (&str, &str, DependencyGroup)> {
        self.dependencies
            .iter()
            .map(|(name, range)| (name.as_str(), range.as_str(), DependencyGroup::Runtime))
            .chain(self.dev_dependencies.iter().map(|(name, range)| {
                (name.as_str(), range.as_str(), DependencyGroup::Development)
            }))
    }
}
