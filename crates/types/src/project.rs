//! The generated project bundle.
//!
//! A generated server travels through the pipeline as a path→content mapping
//! serialized into the `code` field of the generation contract. `ProjectFiles`
//! is that mapping plus the handful of operations the stages need: lookup of
//! the well-known files, line-oriented access for the scanner, and canonical
//! serialization for version snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manifest/build descriptor of the generated project.
pub const MANIFEST_FILE: &str = "package.json";
/// Hosting-platform configuration file.
pub const HOST_CONFIG_FILE: &str = "vercel.json";
/// Entry point implementing the tool-invocation protocol.
pub const ENTRY_FILE: &str = "index.js";
/// Human-readable description file.
pub const README_FILE: &str = "README.md";

/// Path→content mapping of one generated project.
///
/// Paths are kept sorted so serialized forms (snapshots, deployment payloads)
/// are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectFiles {
    files: BTreeMap<String, String>,
}

impl ProjectFiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the generation contract's `code` field.
    ///
    /// The expected shape is a JSON object of path→content strings. Any other
    /// text degrades to a single entry-point file, so one misbehaving model
    /// reply does not lose the generated code.
    #[must_use]
    pub fn from_code_field(code: &str) -> Self {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(code) {
            let mut files = BTreeMap::new();
            let mut all_strings = true;
            for (path, content) in &map {
                match content.as_str() {
                    Some(s) => {
                        files.insert(path.clone(), s.to_string());
                    }
                    None => {
                        all_strings = false;
                        break;
                    }
                }
            }
            if all_strings && !files.is_empty() {
                return Self { files };
            }
        }

        let mut files = BTreeMap::new();
        files.insert(ENTRY_FILE.to_string(), code.to_string());
        Self { files }
    }

    /// Canonical serialized form (paths sorted).
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_code_field(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.files)
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|(path, content)| (path.as_str(), content.as_str()))
    }

    #[must_use]
    pub fn entry_point(&self) -> Option<&str> {
        self.get(ENTRY_FILE)
    }

    #[must_use]
    pub fn manifest(&self) -> Option<&str> {
        self.get(MANIFEST_FILE)
    }

    #[must_use]
    pub fn host_config(&self) -> Option<&str> {
        self.get(HOST_CONFIG_FILE)
    }

    /// Total content size in bytes across all files.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.files.values().map(String::len).sum()
    }

    /// Number of lines in a file, as counted by [`str::lines`].
    #[must_use]
    pub fn line_count(&self, path: &str) -> Option<usize> {
        self.get(path).map(|content| content.lines().count())
    }
}

impl FromIterator<(String, String)> for ProjectFiles {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_field_roundtrip_is_canonical() {
        let mut files = ProjectFiles::new();
        files.insert("index.js", "console.log('hi');\n");
        files.insert("package.json", "{}");

        let serialized = files.to_code_field().expect("serialize");
        let parsed = ProjectFiles::from_code_field(&serialized);
        assert_eq!(parsed, files);

        // Sorted paths: package.json would precede index.js alphabetically
        // only if sorting were lost.
        assert!(serialized.find("index.js") < serialized.find("package.json"));
    }

    #[test]
    fn bare_text_degrades_to_entry_point() {
        let files = ProjectFiles::from_code_field("const x = 1;");
        assert_eq!(files.len(), 1);
        assert_eq!(files.entry_point(), Some("const x = 1;"));
    }

    #[test]
    fn non_string_values_degrade_to_entry_point() {
        let files = ProjectFiles::from_code_field(r#"{"index.js": 42}"#);
        assert_eq!(files.len(), 1);
        assert_eq!(files.entry_point(), Some(r#"{"index.js": 42}"#));
    }

    #[test]
    fn line_count_matches_lines_iterator() {
        let mut files = ProjectFiles::new();
        files.insert("a.js", "one\ntwo\nthree");
        files.insert("b.js", "one\ntwo\n");
        assert_eq!(files.line_count("a.js"), Some(3));
        assert_eq!(files.line_count("b.js"), Some(2));
        assert_eq!(files.line_count("missing.js"), None);
    }
}
