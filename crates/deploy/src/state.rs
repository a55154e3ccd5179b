//! Deployment states and the per-run record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hosting-platform deployment state. Wire form is the platform's
/// upper-case `readyState` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentState {
    Queued,
    Building,
    Ready,
    Error,
    Canceled,
}

impl DeploymentState {
    /// Terminal states end polling: `Ready` successfully, the others not.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error | Self::Canceled)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Building => "building",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one deployment run produced. Held by the orchestrator for the
/// duration of the run and returned to the caller on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub project_id: String,
    pub deployment_id: String,
    pub state: DeploymentState,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!DeploymentState::Queued.is_terminal());
        assert!(!DeploymentState::Building.is_terminal());
        assert!(DeploymentState::Ready.is_terminal());
        assert!(DeploymentState::Error.is_terminal());
        assert!(DeploymentState::Canceled.is_terminal());
    }

    #[test]
    fn wire_form_matches_the_platform_enum() {
        let state: DeploymentState = serde_json::from_str("\"BUILDING\"").expect("parse");
        assert_eq!(state, DeploymentState::Building);
        assert_eq!(state.to_string(), "building");
    }
}
