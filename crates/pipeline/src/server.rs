//! The generated-server record.
//!
//! The one shared mutable resource of the pipeline. Every mutation happens
//! inside a store update; the methods here keep the record's own invariants:
//! `version` never decreases, and a new generation archives the current code
//! before anything overwrites it.

use crate::error::{PipelineError, Result};
use crate::status::ServerStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use toolforge_scanner::ScanResult;
use toolforge_types::{ProjectFiles, SourceDescriptor, SourceKind, ToolDef, slugify};
use uuid::Uuid;

/// Archived snapshots kept per server, most recent first.
pub const PREVIOUS_VERSIONS_CAP: usize = 5;

/// One archived code version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnapshot {
    pub version: u32,
    pub code: ProjectFiles,
    pub archived_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedServer {
    pub id: Uuid,
    pub owner: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub source: SourceDescriptor,
    /// Serialized normalized source from the last analysis, kept so a
    /// regeneration can be inspected against what it was generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_content: Option<String>,
    #[serde(default)]
    pub code: ProjectFiles,
    #[serde(default)]
    pub tools: Vec<ToolDef>,
    pub status: ServerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_url: Option<String>,
    pub version: u32,
    #[serde(default)]
    pub previous_versions: Vec<CodeSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scan: Option<ScanResult>,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GeneratedServer {
    /// Creates a fresh record in `analyzing`.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>, source: SourceDescriptor) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            slug: slugify(&name),
            name,
            description: String::new(),
            source,
            source_content: None,
            code: ProjectFiles::new(),
            tools: Vec::new(),
            status: ServerStatus::Analyzing,
            deployment_url: None,
            version: 1,
            previous_versions: Vec::new(),
            last_scan: None,
            allowed_domains: Vec::new(),
            rate_limit: None,
            documentation: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Moves to `to`, rejecting illegal transitions.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidTransition`] when the state machine forbids
    /// the move.
    pub fn transition(&mut self, to: ServerStatus) -> Result<()> {
        if !self.status.can_transition(to) {
            return Err(PipelineError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replaces the draft with freshly generated output.
    ///
    /// A non-empty current draft is archived first (bumping `version`), so a
    /// repeated generation can never corrupt or partially overwrite it.
    pub fn replace_code(&mut self, code: ProjectFiles, tools: Vec<ToolDef>) {
        if !self.code.is_empty() {
            self.previous_versions.insert(
                0,
                CodeSnapshot {
                    version: self.version,
                    code: std::mem::take(&mut self.code),
                    archived_at: Utc::now(),
                },
            );
            self.previous_versions.truncate(PREVIOUS_VERSIONS_CAP);
            self.version += 1;
        }
        self.code = code;
        self.tools = tools;
        self.last_scan = None;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> GeneratedServer {
        GeneratedServer::new(
            "owner-1",
            "Pet Store",
            SourceDescriptor::Spec {
                url: "https://example.com/openapi.json".to_string(),
            },
        )
    }

    fn bundle(marker: &str) -> ProjectFiles {
        let mut files = ProjectFiles::new();
        files.insert("index.js", marker);
        files
    }

    #[test]
    fn new_records_start_analyzing_at_version_one() {
        let s = server();
        assert_eq!(s.status, ServerStatus::Analyzing);
        assert_eq!(s.version, 1);
        assert_eq!(s.slug, "pet-store");
        assert!(s.code.is_empty());
    }

    #[test]
    fn first_generation_does_not_bump_the_version() {
        let mut s = server();
        s.replace_code(bundle("v1"), vec![]);
        assert_eq!(s.version, 1);
        assert!(s.previous_versions.is_empty());
    }

    #[test]
    fn regeneration_archives_before_overwriting() {
        let mut s = server();
        s.replace_code(bundle("v1"), vec![]);
        s.replace_code(bundle("v2"), vec![]);

        assert_eq!(s.version, 2);
        assert_eq!(s.code.entry_point(), Some("v2"));
        assert_eq!(s.previous_versions.len(), 1);
        assert_eq!(s.previous_versions[0].version, 1);
        assert_eq!(s.previous_versions[0].code.entry_point(), Some("v1"));
    }

    #[test]
    fn version_never_decreases_and_snapshots_are_capped() {
        let mut s = server();
        let mut last = s.version;
        for i in 0..10 {
            s.replace_code(bundle(&format!("v{i}")), vec![]);
            assert!(s.version >= last);
            last = s.version;
        }
        assert_eq!(s.previous_versions.len(), PREVIOUS_VERSIONS_CAP);
        // Most recent first.
        assert_eq!(s.previous_versions[0].version, s.version - 1);
    }

    #[test]
    fn replacing_code_invalidates_the_scan() {
        let mut s = server();
        s.replace_code(bundle("v1"), vec![]);
        s.last_scan = Some(toolforge_scanner::ScanResult::from_issues(Vec::new()));
        s.replace_code(bundle("v2"), vec![]);
        assert!(s.last_scan.is_none());
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut s = server();
        let err = s.transition(ServerStatus::Deployed).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTransition { .. }));
        assert_eq!(s.status, ServerStatus::Analyzing);
    }
}
