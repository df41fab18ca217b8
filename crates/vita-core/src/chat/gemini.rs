//! Google Gemini backend
//!
//! Calls `POST {host}/v1beta/models/{model}:generateContent` with the prompt
//! as a single text part and returns the first candidate's text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::ChatBackend;

const BACKEND_NAME: &str = "Gemini";

/// Gemini `generateContent` backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending Gemini request");

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                backend: BACKEND_NAME.to_string(),
                message: format!("{}: {}", status, body),
            });
        }

        let body: GenerateContentResponse = response.json().await?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| Error::Api {
                backend: BACKEND_NAME.to_string(),
                message: "No candidates in response".into(),
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
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Part {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Candidate {
    pub content: Content,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChatServer;

    fn backend(url: &str) -> GeminiBackend {
        GeminiBackend::new(url, "gemini-2.0-flash", "test-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint() {
        let b = backend("https://generativelanguage.googleapis.com/");
        assert_eq!(
            b.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let server = MockChatServer::start().await;
        let reply = backend(&server.url())
            .complete("System\n\nUser: how much water?\nVita:")
            .await
            .unwrap();
        assert_eq!(reply, "Echo: how much water?");
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let server = MockChatServer::start_failing().await;
        let err = backend(&server.url()).complete("User: hi").await.unwrap_err();
        match err {
            Error::Api { backend, message } => {
                assert_eq!(backend, "Gemini");
                assert!(message.contains("500"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
