//! Audit trail for scan and review actions.
//!
//! Every scan, and every sanitize/approve/reject taken on a scan's result,
//! appends one entry. The trail is in-memory and append-only; readers get
//! snapshots.

use crate::report::ScanResult;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Scan,
    Sanitize,
    Reject,
    Approve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    /// Slug of the server the action applied to.
    pub server: String,
    pub actor: String,
    pub action: AuditAction,
    pub scan: ScanResult,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Default)]
pub struct AuditTrail {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl AuditTrail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry and returns its id.
    pub fn record(
        &self,
        server: &str,
        actor: &str,
        action: AuditAction,
        scan: ScanResult,
        metadata: Option<Value>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.write().push(AuditLogEntry {
            id,
            server: server.to_string(),
            actor: actor.to_string(),
            action,
            scan,
            at: Utc::now(),
            metadata,
        });
        id
    }

    /// Entries for one server, oldest first.
    #[must_use]
    pub fn entries_for(&self, server: &str) -> Vec<AuditLogEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.server == server)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_assigns_unique_ids_and_filters_by_server() {
        let trail = AuditTrail::new();
        let scan = ScanResult::from_issues(Vec::new());

        let a = trail.record("petstore", "system", AuditAction::Scan, scan.clone(), None);
        let b = trail.record("petstore", "system", AuditAction::Approve, scan.clone(), None);
        let c = trail.record("orders", "system", AuditAction::Scan, scan, None);

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(trail.len(), 3);

        let petstore = trail.entries_for("petstore");
        assert_eq!(petstore.len(), 2);
        assert_eq!(petstore[0].action, AuditAction::Scan);
        assert_eq!(petstore[1].action, AuditAction::Approve);
    }

    #[test]
    fn metadata_rides_along() {
        let trail = AuditTrail::new();
        let scan = ScanResult::from_issues(Vec::new());
        trail.record(
            "petstore",
            "reviewer",
            AuditAction::Sanitize,
            scan,
            Some(serde_json::json!({"redactedLines": 2})),
        );
        let entries = trail.entries_for("petstore");
        assert_eq!(entries[0].metadata.as_ref().and_then(|m| m["redactedLines"].as_u64()), Some(2));
    }
}
