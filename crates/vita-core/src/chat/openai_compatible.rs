//! OpenAI-compatible backend
//!
//! Works with any server that implements the OpenAI chat completions API
//! (OpenAI itself, vLLM, LocalAI, llama-server and similar).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::ChatBackend;

const BACKEND_NAME: &str = "OpenAI-compatible";

/// OpenAI-compatible `/v1/chat/completions` backend
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.map(String::from),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAICompatibleBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending chat completion request");

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                backend: BACKEND_NAME.to_string(),
                message: format!("{}: {}", status, body),
            });
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| Error::Api {
                backend: BACKEND_NAME.to_string(),
                message: "No choices in response".into(),
            })
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Choice {
    pub message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChatServer;

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let server = MockChatServer::start().await;
        let backend = OpenAICompatibleBackend::new(
            &server.url(),
            "llama3.2",
            Some("secret"),
            Duration::from_secs(5),
        )
        .unwrap();

        let reply = backend.complete("User: am I sleeping enough?\nVita:").await.unwrap();
        assert_eq!(reply, "Echo: am I sleeping enough?");
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let backend = OpenAICompatibleBackend::new(
            &format!("http://{}", addr),
            "llama3.2",
            None,
            Duration::from_secs(2),
        )
        .unwrap();
        assert!(matches!(
            backend.complete("User: hi").await,
            Err(Error::Http(_))
        ));
    }
}
