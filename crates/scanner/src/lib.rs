//! Static security scanning for generated tool servers.
//!
//! Five detectors compose into one [`scan::scan_project`] pass: credential
//! leaks, dangerous code, insecure dependencies, missing configuration, and
//! sandbox compliance. Scanning never errors; detectors that cannot parse
//! their input contribute nothing. [`sanitize::sanitize_project`] redacts
//! critical lines without moving the others, and [`audit::AuditTrail`]
//! records every action taken on a verdict.

pub mod audit;
mod config_checks;
mod credentials;
mod dangerous;
mod deps;
pub mod report;
mod sandbox;
pub mod sanitize;
pub mod scan;

pub use audit::{AuditAction, AuditLogEntry, AuditTrail};
pub use report::{IssueKind, ScanResult, SecurityIssue, Severity};
pub use sanitize::{REDACTION_MARKER, sanitize_project};
pub use scan::{ScanPolicy, scan_project};
