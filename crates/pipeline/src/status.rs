//! Server lifecycle states and the legal transitions between them.

use serde::{Deserialize, Serialize};

/// Lifecycle of a generated server.
///
/// `analyzing → generating → draft → deploying → {deployed | failed}`.
/// `failed` ends the attempt, not the server: a fresh generation re-enters
/// `generating`. Reaching `draft` does not require a scan; leaving it toward
/// `deploying` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Analyzing,
    Generating,
    Draft,
    Deploying,
    Deployed,
    Failed,
}

impl ServerStatus {
    /// Whether moving from `self` to `to` is legal. Every store write that
    /// changes status goes through this.
    #[must_use]
    pub fn can_transition(self, to: Self) -> bool {
        use ServerStatus::{Analyzing, Deployed, Deploying, Draft, Failed, Generating};
        matches!(
            (self, to),
            (Analyzing, Generating | Failed)
                | (Generating, Draft | Failed)
                | (Draft, Deploying | Generating)
                | (Deploying, Deployed | Failed)
                | (Deployed | Failed, Generating)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analyzing => "analyzing",
            Self::Generating => "generating",
            Self::Draft => "draft",
            Self::Deploying => "deploying",
            Self::Deployed => "deployed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
