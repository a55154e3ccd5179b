//! Deployment orchestration: bundle, provision, poll, probe.
//!
//! One [`Deployer::deploy`] call drives a full run: assemble the request,
//! ensure the hosting project, submit the deployment, poll until a terminal
//! state or the timeout, then probe application health. "Platform ready" and
//! "application healthy" are distinct; only both together succeed.

use crate::bundle::build_request;
use crate::client::{DeploymentStatus, HostingClient};
use crate::error::{DeployError, Result};
use crate::state::{DeploymentRecord, DeploymentState};
use crate::ticker::Ticker;
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use toolforge_types::ProjectFiles;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Time between status polls.
    pub poll_interval: Duration,
    /// Overall budget for reaching a terminal state.
    pub timeout: Duration,
    /// Budget for the post-ready health probe.
    pub health_timeout: Duration,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            timeout: Duration::from_secs(300),
            health_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Deployer {
    host: Arc<dyn HostingClient>,
    ticker: Arc<dyn Ticker>,
    http: reqwest::Client,
    config: DeployConfig,
}

#[derive(Debug, Deserialize)]
struct HealthReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl Deployer {
    #[must_use]
    pub fn new(
        host: Arc<dyn HostingClient>,
        ticker: Arc<dyn Ticker>,
        config: DeployConfig,
    ) -> Self {
        Self {
            host,
            ticker,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Runs one deployment to completion.
    ///
    /// # Errors
    ///
    /// [`DeployError::TerminalState`] when the platform reports error or
    /// canceled, [`DeployError::Timeout`] when the budget elapses first,
    /// [`DeployError::HealthCheck`] when the platform is ready but the
    /// application is not serving, [`DeployError::Canceled`] when the caller
    /// cancels mid-poll.
    pub async fn deploy(
        &self,
        slug: &str,
        files: &ProjectFiles,
        env: &BTreeMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<DeploymentRecord> {
        let request = build_request(slug, files, env)?;
        let project_id = self.host.ensure_project(slug).await?;
        info!(slug, project_id, files = request.files.len(), "submitting deployment");

        let status = self.host.create_deployment(&request).await?;
        let mut record = DeploymentRecord {
            project_id,
            deployment_id: status.id.clone(),
            state: status.state,
            url: status.url.clone().unwrap_or_default(),
            created_at: Utc::now(),
            building_at: None,
            ready_at: None,
        };

        let status = self.poll_until_terminal(status, &mut record, cancel).await?;

        record.state = DeploymentState::Ready;
        record.ready_at = Some(Utc::now());
        if let Some(url) = status.url {
            record.url = url;
        }
        if record.url.is_empty() {
            return Err(DeployError::MissingUrl);
        }

        self.probe_health(&record.url).await?;
        info!(slug, url = %record.url, "deployment ready and healthy");
        Ok(record)
    }

    /// Polls until ready, erroring on non-ready terminal states, timeout, or
    /// cancellation. Never issues another status read after a terminal state.
    async fn poll_until_terminal(
        &self,
        mut status: DeploymentStatus,
        record: &mut DeploymentRecord,
        cancel: &CancellationToken,
    ) -> Result<DeploymentStatus> {
        let max_polls = max_polls(self.config.timeout, self.config.poll_interval);

        for _ in 0..max_polls {
            match status.state {
                DeploymentState::Ready => return Ok(status),
                DeploymentState::Error | DeploymentState::Canceled => {
                    return Err(DeployError::TerminalState { state: status.state });
                }
                DeploymentState::Queued => {}
                DeploymentState::Building => {
                    if record.building_at.is_none() {
                        record.building_at = Some(Utc::now());
                    }
                }
            }

            tokio::select! {
                () = cancel.cancelled() => return Err(DeployError::Canceled),
                () = self.ticker.tick() => {}
            }

            status = self.host.deployment_status(&status.id).await?;
            record.state = status.state;
            debug!(deployment = %status.id, state = %status.state, "deployment status");
        }

        if status.state == DeploymentState::Ready {
            return Ok(status);
        }
        Err(DeployError::Timeout(self.config.timeout.as_secs()))
    }

    async fn probe_health(&self, deployment_url: &str) -> Result<()> {
        let url = health_url(deployment_url);
        let fail = |reason: String| DeployError::HealthCheck {
            url: url.clone(),
            reason,
        };

        let fut = self.http.get(&url).send();
        let response = match tokio::time::timeout(self.config.health_timeout, fut).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => return Err(fail(toolforge_fetch::sanitize_reqwest_error(&e))),
            Err(_) => return Err(fail("health probe timed out".to_string())),
        };

        if !response.status().is_success() {
            return Err(fail(format!("status {}", response.status().as_u16())));
        }

        // The contract is `{ok, error?}`; non-JSON 2xx bodies pass, a body
        // saying `ok: false` fails even on 200.
        let body = toolforge_fetch::read_text_limited(response, 4096)
            .await
            .unwrap_or_default();
        if let Ok(reply) = serde_json::from_str::<HealthReply>(&body)
            && !reply.ok
        {
            return Err(fail(
                reply.error.unwrap_or_else(|| "application reported ok: false".to_string()),
            ));
        }
        Ok(())
    }
}

/// How many status reads fit into the timeout budget.
fn max_polls(timeout: Duration, interval: Duration) -> u32 {
    let interval = interval.max(Duration::from_millis(1));
    (timeout.as_secs_f64() / interval.as_secs_f64()).ceil() as u32
}

/// Platform status reads report bare hostnames; the probe needs a URL.
fn health_url(deployment_url: &str) -> String {
    let base = if deployment_url.contains("://") {
        deployment_url.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", deployment_url.trim_end_matches('/'))
    };
    format!("{base}/health")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DeploymentRequest;
    use async_trait::async_trait;
    use axum::routing::get;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::net::TcpListener;

    /// Ticker that never sleeps.
    struct ManualTicker;

    #[async_trait]
    impl Ticker for ManualTicker {
        async fn tick(&self) {}
    }

    /// Host that replays a scripted sequence of states.
    struct ScriptedHost {
        states: Mutex<VecDeque<DeploymentState>>,
        url: Option<String>,
        polls: AtomicU32,
    }

    impl ScriptedHost {
        fn new(states: impl IntoIterator<Item = DeploymentState>, url: Option<String>) -> Arc<Self> {
            Arc::new(Self {
                states: Mutex::new(states.into_iter().collect()),
                url,
                polls: AtomicU32::new(0),
            })
        }

        fn status(&self) -> DeploymentStatus {
            let state = self
                .states
                .lock()
                .pop_front()
                .unwrap_or(DeploymentState::Building);
            DeploymentStatus {
                id: "dpl_1".to_string(),
                state,
                url: self.url.clone(),
            }
        }
    }

    #[async_trait]
    impl HostingClient for ScriptedHost {
        async fn ensure_project(&self, _slug: &str) -> Result<String> {
            Ok("prj_1".to_string())
        }

        async fn create_deployment(&self, _request: &DeploymentRequest) -> Result<DeploymentStatus> {
            Ok(self.status())
        }

        async fn deployment_status(&self, _id: &str) -> Result<DeploymentStatus> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(self.status())
        }
    }

    async fn health_server(body: Value) -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new().route("/health", get(move || {
            let body = body.clone();
            async move { Json(body) }
        }));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        (format!("http://{addr}"), handle)
    }

    fn deployer(host: Arc<dyn HostingClient>, timeout: Duration) -> Deployer {
        Deployer::new(
            host,
            Arc::new(ManualTicker),
            DeployConfig {
                poll_interval: Duration::from_secs(3),
                timeout,
                health_timeout: Duration::from_secs(5),
            },
        )
    }

    fn bundle() -> ProjectFiles {
        let mut files = ProjectFiles::new();
        files.insert("index.js", "module.exports = app;\n");
        files
    }

    #[tokio::test]
    async fn ready_after_k_polls_succeeds_after_exactly_k_status_reads() {
        let (url, server) = health_server(json!({"ok": true})).await;
        // Create returns queued; then building, building, ready.
        let host = ScriptedHost::new(
            [
                DeploymentState::Queued,
                DeploymentState::Building,
                DeploymentState::Building,
                DeploymentState::Ready,
            ],
            Some(url),
        );

        let record = deployer(host.clone(), Duration::from_secs(300))
            .deploy("petstore", &bundle(), &BTreeMap::new(), &CancellationToken::new())
            .await
            .expect("deploy");

        assert_eq!(host.polls.load(Ordering::SeqCst), 3);
        assert_eq!(record.state, DeploymentState::Ready);
        assert!(record.ready_at.is_some());
        assert!(record.building_at.is_some());
        server.abort();
    }

    #[tokio::test]
    async fn never_ready_fails_with_timeout_at_the_boundary() {
        // 9s budget at 3s interval: exactly 3 status reads, then timeout.
        let host = ScriptedHost::new([DeploymentState::Queued], None);
        let err = deployer(host.clone(), Duration::from_secs(9))
            .deploy("petstore", &bundle(), &BTreeMap::new(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Timeout(9)));
        assert_eq!(host.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn error_state_fails_without_further_polls() {
        let host = ScriptedHost::new(
            [DeploymentState::Queued, DeploymentState::Error],
            None,
        );
        let err = deployer(host.clone(), Duration::from_secs(300))
            .deploy("petstore", &bundle(), &BTreeMap::new(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            DeployError::TerminalState { state } => assert_eq!(state, DeploymentState::Error),
            other => panic!("unexpected error: {other}"),
        }
        // One read observed Error; none after.
        assert_eq!(host.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unhealthy_application_fails_a_ready_deployment() {
        let (url, server) = health_server(json!({"ok": false, "error": "no upstream"})).await;
        let host = ScriptedHost::new([DeploymentState::Ready], Some(url));

        let err = deployer(host, Duration::from_secs(300))
            .deploy("petstore", &bundle(), &BTreeMap::new(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            DeployError::HealthCheck { reason, .. } => assert_eq!(reason, "no upstream"),
            other => panic!("unexpected error: {other}"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_polling() {
        let host = ScriptedHost::new([DeploymentState::Queued], None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = deployer(host.clone(), Duration::from_secs(300))
            .deploy("petstore", &bundle(), &BTreeMap::new(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Canceled));
        assert_eq!(host.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ready_without_a_url_is_an_error() {
        let host = ScriptedHost::new([DeploymentState::Ready], None);
        let err = deployer(host, Duration::from_secs(300))
            .deploy("petstore", &bundle(), &BTreeMap::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::MissingUrl));
    }
}
