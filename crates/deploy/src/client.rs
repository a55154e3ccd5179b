//! Hosting-platform client.
//!
//! The platform contract is small: ensure a project, submit a deployment,
//! read its state. The trait exists so the orchestrator and the pipeline
//! tests can run against a scripted host instead of the real platform.

use crate::error::{DeployError, Result};
use crate::state::DeploymentState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cap on error-response bodies echoed into error messages.
const ERROR_BODY_LIMIT: usize = 2048;

#[derive(Debug, Clone)]
pub struct HostingConfig {
    /// Platform API origin, e.g. `https://api.vercel.com`.
    pub base_url: String,
    pub token: String,
}

/// One file of a deployment, transported binary-safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    /// Path within the deployment, e.g. `index.js`.
    pub file: String,
    /// Base64-encoded content.
    pub data: String,
    /// Hex sha256 of the raw content.
    pub sha: String,
    pub encoding: &'static str,
}

/// Everything one deployment submission carries.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentRequest {
    pub name: String,
    pub files: Vec<FilePayload>,
    pub target: &'static str,
    pub env: BTreeMap<String, String>,
}

/// The platform's view of a deployment, as returned by create and status
/// reads.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentStatus {
    pub id: String,
    #[serde(rename = "readyState")]
    pub state: DeploymentState,
    #[serde(default)]
    pub url: Option<String>,
}

#[async_trait]
pub trait HostingClient: Send + Sync {
    /// Creates the project named `slug`, or reuses it if it already exists.
    /// Returns the project id.
    async fn ensure_project(&self, slug: &str) -> Result<String>;

    /// Submits a new deployment and returns its initial status.
    async fn create_deployment(&self, request: &DeploymentRequest) -> Result<DeploymentStatus>;

    /// Reads the current state of a deployment.
    async fn deployment_status(&self, id: &str) -> Result<DeploymentStatus>;
}

/// HTTP client against the hosting platform's REST API.
pub struct HttpHostingClient {
    client: reqwest::Client,
    config: HostingConfig,
}

#[derive(Debug, Deserialize)]
struct ProjectReply {
    id: String,
}

impl HttpHostingClient {
    #[must_use]
    pub fn new(config: HostingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn platform_error(response: reqwest::Response) -> DeployError {
        let status = response.status().as_u16();
        let body = toolforge_fetch::read_text_limited(response, ERROR_BODY_LIMIT)
            .await
            .unwrap_or_default();
        DeployError::Platform { status, body }
    }
}

#[async_trait]
impl HostingClient for HttpHostingClient {
    async fn ensure_project(&self, slug: &str) -> Result<String> {
        // Reuse before create: projects are keyed by slug.
        let lookup = self
            .client
            .get(self.url(&format!("/v9/projects/{slug}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        if lookup.status().is_success() {
            let project: ProjectReply = lookup.json().await?;
            return Ok(project.id);
        }
        if lookup.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Self::platform_error(lookup).await);
        }

        let created = self
            .client
            .post(self.url("/v9/projects"))
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({
                "name": slug,
                "installCommand": "npm install",
                "buildCommand": "",
                "outputDirectory": ".",
            }))
            .send()
            .await?;
        if !created.status().is_success() {
            return Err(Self::platform_error(created).await);
        }
        let project: ProjectReply = created.json().await?;
        Ok(project.id)
    }

    async fn create_deployment(&self, request: &DeploymentRequest) -> Result<DeploymentStatus> {
        let response = self
            .client
            .post(self.url("/v13/deployments"))
            .bearer_auth(&self.config.token)
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::platform_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn deployment_status(&self, id: &str) -> Result<DeploymentStatus> {
        let response = self
            .client
            .get(self.url(&format!("/v13/deployments/{id}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::platform_error(response).await);
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        (format!("http://{addr}"), handle)
    }

    fn client(base_url: String) -> HttpHostingClient {
        HttpHostingClient::new(HostingConfig {
            base_url,
            token: "test-token".to_string(),
        })
    }

    #[tokio::test]
    async fn ensure_project_reuses_an_existing_project() {
        async fn lookup(Path(slug): Path<String>) -> Json<Value> {
            Json(json!({"id": format!("prj_{slug}"), "name": slug}))
        }

        let (base_url, server) =
            serve(Router::new().route("/v9/projects/{slug}", get(lookup))).await;
        let id = client(base_url)
            .ensure_project("petstore")
            .await
            .expect("ensure");
        assert_eq!(id, "prj_petstore");
        server.abort();
    }

    #[tokio::test]
    async fn ensure_project_creates_on_404() {
        async fn missing() -> axum::http::StatusCode {
            axum::http::StatusCode::NOT_FOUND
        }
        async fn create(Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(body["name"], "petstore");
            Json(json!({"id": "prj_new"}))
        }

        let app = Router::new()
            .route("/v9/projects/{slug}", get(missing))
            .route("/v9/projects", post(create));
        let (base_url, server) = serve(app).await;
        let id = client(base_url)
            .ensure_project("petstore")
            .await
            .expect("ensure");
        assert_eq!(id, "prj_new");
        server.abort();
    }

    #[tokio::test]
    async fn create_deployment_parses_the_platform_state() {
        async fn create(Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(body["target"], "production");
            assert_eq!(body["files"][0]["encoding"], "base64");
            Json(json!({"id": "dpl_1", "readyState": "QUEUED", "url": "petstore.example.app"}))
        }

        let (base_url, server) =
            serve(Router::new().route("/v13/deployments", post(create))).await;
        let request = DeploymentRequest {
            name: "petstore".to_string(),
            files: vec![FilePayload {
                file: "index.js".to_string(),
                data: "bW9kdWxl".to_string(),
                sha: "ab".to_string(),
                encoding: "base64",
            }],
            target: "production",
            env: BTreeMap::new(),
        };
        let status = client(base_url)
            .create_deployment(&request)
            .await
            .expect("create");
        assert_eq!(status.id, "dpl_1");
        assert_eq!(status.state, DeploymentState::Queued);
        server.abort();
    }

    #[tokio::test]
    async fn platform_errors_carry_status_and_body() {
        async fn forbidden() -> (axum::http::StatusCode, &'static str) {
            (axum::http::StatusCode::FORBIDDEN, "bad token")
        }

        let (base_url, server) =
            serve(Router::new().route("/v13/deployments/{id}", get(forbidden))).await;
        let err = client(base_url)
            .deployment_status("dpl_1")
            .await
            .unwrap_err();
        match err {
            DeployError::Platform { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "bad token");
            }
            other => panic!("unexpected error: {other}"),
        }
        server.abort();
    }
}
