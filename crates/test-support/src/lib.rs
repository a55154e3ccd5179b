//! Test helpers shared across the toolforge crates.
//!
//! Mock HTTP services are plain axum routers served on an ephemeral port;
//! [`ServedApp`] shuts the server down when dropped so tests cannot leak
//! listeners.

use anyhow::Context as _;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A router served on an ephemeral localhost port. Aborts the server task on
/// drop.
pub struct ServedApp {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for ServedApp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serves an axum router on an ephemeral port and returns its base URL.
///
/// # Errors
///
/// Returns an error if binding the listener fails.
pub async fn serve_router(app: Router) -> anyhow::Result<ServedApp> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind ephemeral port")?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(ServedApp {
        base_url: format!("http://{addr}"),
        handle,
    })
}

/// A mock model service: answers `POST /v1/messages` with scripted replies,
/// in order, wrapped in the messages-API envelope.
pub struct MockModelService {
    replies: Arc<Mutex<VecDeque<String>>>,
}

impl MockModelService {
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
        }
    }

    /// Serves the mock and returns its base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the listener fails.
    pub async fn serve(&self) -> anyhow::Result<ServedApp> {
        let replies = Arc::clone(&self.replies);
        let app = Router::new().route(
            "/v1/messages",
            post(move || {
                let replies = Arc::clone(&replies);
                async move {
                    let text = replies
                        .lock()
                        .pop_front()
                        .unwrap_or_else(|| "{}".to_string());
                    Json(serde_json::json!({
                        "content": [{"type": "text", "text": text}]
                    }))
                }
            }),
        );
        serve_router(app).await
    }

    /// Replies not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}
