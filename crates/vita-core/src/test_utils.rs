//! Test utilities for vita-core
//!
//! This module provides a mock chat server speaking both the Gemini
//! `generateContent` and the OpenAI `/v1/chat/completions` protocols. It can
//! be used for development and integration tests without network access.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::chat::mock::last_user_line;

type LastPrompt = Arc<Mutex<Option<String>>>;

/// Mock chat server for testing and development
///
/// Replies `Echo: <last user line>` to every prompt.
pub struct MockChatServer {
    addr: SocketAddr,
    last_prompt: LastPrompt,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockChatServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let last_prompt = LastPrompt::default();
        let app = Router::new()
            .route("/v1beta/models/:model", post(handle_generate_content))
            .route("/v1/chat/completions", post(handle_chat_completions))
            .with_state(last_prompt.clone());

        Self::serve(app, last_prompt).await
    }

    /// Start a server that answers every request with HTTP 500
    pub async fn start_failing() -> Self {
        let app = Router::new().fallback(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, "model overloaded")
        });
        Self::serve(app, LastPrompt::default()).await
    }

    async fn serve(app: Router, last_prompt: LastPrompt) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            last_prompt,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The most recent prompt received on either protocol
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Gemini generateContent endpoint (`{model}:generateContent`)
async fn handle_generate_content(
    State(last_prompt): State<LastPrompt>,
    Json(request): Json<Value>,
) -> Json<Value> {
    let prompt = request["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let reply = format!("Echo: {}", last_user_line(&prompt));
    *last_prompt.lock().unwrap() = Some(prompt);

    Json(json!({
        "candidates": [{
            "content": { "parts": [{ "text": reply }], "role": "model" },
            "finishReason": "STOP"
        }]
    }))
}

/// OpenAI chat completions endpoint
async fn handle_chat_completions(
    State(last_prompt): State<LastPrompt>,
    Json(request): Json<Value>,
) -> Json<Value> {
    let prompt = request["messages"][0]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let reply = format!("Echo: {}", last_user_line(&prompt));
    *last_prompt.lock().unwrap() = Some(prompt);

    Json(json!({
        "model": request["model"],
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": reply },
            "finish_reason": "stop"
        }]
    }))
}
