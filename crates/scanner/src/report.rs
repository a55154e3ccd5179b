//! Scan verdicts and their constituent issues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue severity, ordered worst-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Score deduction per issue of this severity.
    #[must_use]
    pub fn deduction(self) -> u32 {
        match self {
            Self::Critical => 40,
            Self::High => 20,
            Self::Medium => 10,
            Self::Low => 5,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What class of problem an issue reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Credential,
    DangerousCode,
    InsecureDependency,
    Vulnerability,
}

/// One finding from one detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    /// Project file the issue was found in, when the finding is line-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-based line within `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl SecurityIssue {
    #[must_use]
    pub fn new(kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            file: None,
            line: None,
            fix: None,
        }
    }

    #[must_use]
    pub fn at(mut self, file: &str, line: u32) -> Self {
        self.file = Some(file.to_string());
        self.line = Some(line);
        self
    }

    /// File attribution without a line, for findings that are not line-scoped.
    #[must_use]
    pub fn in_file(mut self, file: &str) -> Self {
        self.file = Some(file.to_string());
        self
    }

    #[must_use]
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }
}

/// The scanner's verdict over one project bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub passed: bool,
    pub issues: Vec<SecurityIssue>,
    /// 0 to 100, derived from weighted severity counts.
    pub score: u32,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    /// Derives `score` and `passed` from the issue list.
    ///
    /// `passed` holds exactly when no issue is critical or high.
    #[must_use]
    pub fn from_issues(issues: Vec<SecurityIssue>) -> Self {
        let deduction: u32 = issues.iter().map(|i| i.severity.deduction()).sum();
        let passed = !issues
            .iter()
            .any(|i| matches!(i.severity, Severity::Critical | Severity::High));
        Self {
            passed,
            issues,
            score: 100u32.saturating_sub(deduction),
            scanned_at: Utc::now(),
        }
    }

    /// Issues of the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_worst_first() {
        assert!(Severity::Critical < Severity::High);
        assert!(Severity::High < Severity::Medium);
        assert!(Severity::Medium < Severity::Low);
    }

    #[test]
    fn score_deducts_by_severity_and_floors_at_zero() {
        let issues = vec![
            SecurityIssue::new(IssueKind::Credential, Severity::Critical, "a"),
            SecurityIssue::new(IssueKind::DangerousCode, Severity::High, "b"),
            SecurityIssue::new(IssueKind::Vulnerability, Severity::Medium, "c"),
            SecurityIssue::new(IssueKind::Vulnerability, Severity::Low, "d"),
        ];
        let result = ScanResult::from_issues(issues);
        assert_eq!(result.score, 100 - (40 + 20 + 10 + 5));
        assert!(!result.passed);

        let many = (0..5)
            .map(|i| SecurityIssue::new(IssueKind::Credential, Severity::Critical, format!("{i}")))
            .collect();
        assert_eq!(ScanResult::from_issues(many).score, 0);
    }

    #[test]
    fn passed_requires_no_critical_and_no_high() {
        let clean = ScanResult::from_issues(Vec::new());
        assert!(clean.passed);
        assert_eq!(clean.score, 100);

        let medium_only = ScanResult::from_issues(vec![SecurityIssue::new(
            IssueKind::Vulnerability,
            Severity::Medium,
            "m",
        )]);
        assert!(medium_only.passed);

        let with_high = ScanResult::from_issues(vec![SecurityIssue::new(
            IssueKind::DangerousCode,
            Severity::High,
            "h",
        )]);
        assert!(!with_high.passed);
    }

    #[test]
    fn issue_kind_serializes_with_spec_wire_names() {
        let issue = SecurityIssue::new(IssueKind::InsecureDependency, Severity::Medium, "x");
        let json = serde_json::to_value(&issue).expect("serialize");
        assert_eq!(json["type"], "insecure_dependency");
        assert_eq!(json["severity"], "medium");
    }
}
