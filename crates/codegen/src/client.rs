//! Model-service client.
//!
//! One request per pipeline stage that needs the model; replies are free text
//! handed to [`crate::extract`] for contract parsing. The trait exists so
//! tests and the pipeline can substitute scripted fakes without global state.

use crate::error::{CodegenError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Cap on error-response bodies echoed into error messages.
const ERROR_BODY_LIMIT: usize = 2048;

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Service origin, e.g. `https://api.anthropic.com`.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_key: String::new(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 8192,
            timeout: Duration::from_secs(120),
        }
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends one prompt and returns the reply text verbatim.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Messages-style HTTP client for the model service.
pub struct HttpModelClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl HttpModelClient {
    #[must_use]
    pub fn new(config: ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageReply {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1/messages",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!(model = %self.config.model, prompt_chars = prompt.len(), "model request");

        let fut = async {
            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = toolforge_fetch::read_text_limited(response, ERROR_BODY_LIMIT)
                    .await
                    .unwrap_or_default();
                return Err(CodegenError::Service {
                    status: status.as_u16(),
                    body,
                });
            }

            let reply: MessageReply = response.json().await?;
            Ok(collect_text(reply))
        };

        match tokio::time::timeout(self.config.timeout, fut).await {
            Ok(r) => r,
            Err(_) => Err(CodegenError::Timeout(self.config.timeout.as_secs())),
        }
    }
}

fn collect_text(reply: MessageReply) -> String {
    let mut out = String::new();
    for block in reply.content {
        if let ContentBlock::Text { text } = block {
            out.push_str(&text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::routing::post;
    use serde_json::Value;
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn complete_concatenates_text_blocks() {
        async fn messages_handler(axum::Json(body): axum::Json<Value>) -> axum::Json<Value> {
            assert_eq!(body["messages"][0]["role"], "user");
            axum::Json(serde_json::json!({
                "content": [
                    {"type": "text", "text": "hello "},
                    {"type": "tool_use", "id": "x", "name": "y", "input": {}},
                    {"type": "text", "text": "world"},
                ]
            }))
        }

        let (base_url, server) = serve(Router::new().route("/v1/messages", post(messages_handler))).await;

        let client = HttpModelClient::new(ModelConfig {
            base_url,
            api_key: "test-key".to_string(),
            ..ModelConfig::default()
        });
        let reply = client.complete("say hello").await.expect("complete");
        assert_eq!(reply, "hello world");

        server.abort();
    }

    #[tokio::test]
    async fn complete_surfaces_service_errors_with_status() {
        async fn overloaded_handler() -> (axum::http::StatusCode, &'static str) {
            (axum::http::StatusCode::SERVICE_UNAVAILABLE, "overloaded")
        }

        let (base_url, server) =
            serve(Router::new().route("/v1/messages", post(overloaded_handler))).await;

        let client = HttpModelClient::new(ModelConfig {
            base_url,
            ..ModelConfig::default()
        });
        let err = client.complete("hi").await.unwrap_err();
        match err {
            CodegenError::Service { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }

        server.abort();
    }
}
