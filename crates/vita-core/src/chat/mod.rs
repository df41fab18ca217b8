//! Pluggable chat backend for the health coach
//!
//! This module forwards a user's question, the earlier turns of the
//! conversation and (optionally) their generated insights to a hosted
//! language model.
//!
//! # Architecture
//!
//! - `ChatBackend` trait: one completion call per turn
//! - `ChatClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenAICompatibleBackend`, `MockBackend`
//! - `ChatSession`: conversation state, prompt assembly and error-to-warning mapping
//!
//! # Configuration
//!
//! Environment variables (read by [`ChatConfig::from_env`]):
//! - `CHAT_BACKEND`: gemini (default), openai_compatible, mock
//! - `GEMINI_API_KEY`: API key (required for gemini)
//! - `GEMINI_MODEL`: Model name (default: gemini-2.0-flash)
//! - `GEMINI_HOST`: API base URL (default: https://generativelanguage.googleapis.com)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)
//! - `CHAT_TIMEOUT_SECS`: Request timeout in seconds (default: 60)

mod context;
mod gemini;
pub(crate) mod mock;
mod openai_compatible;
mod session;

pub use context::{InsightContext, InsightTable};
pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use session::{build_prompt, ChatSession, Conversation, Speaker, Turn, SYSTEM_PROMPT};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

pub const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Trait implemented by every chat backend
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a fully assembled prompt and return the model's reply text
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Provider name used in user-facing warnings
    fn name(&self) -> &'static str;

    /// Get the model name (for logging)
    fn model(&self) -> &str;
}

/// Which provider a [`ChatConfig`] targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Gemini,
    OpenAICompatible,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini",
            BackendKind::OpenAICompatible => "openai_compatible",
            BackendKind::Mock => "mock",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(BackendKind::Gemini),
            "openai_compatible" | "openai" => Ok(BackendKind::OpenAICompatible),
            "mock" => Ok(BackendKind::Mock),
            _ => Err(format!("Unknown chat backend: {}", s)),
        }
    }
}

/// Explicit connection settings for a chat backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub backend: BackendKind,
    pub host: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ChatConfig {
    /// Gemini settings with the default host and model
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Gemini,
            host: DEFAULT_GEMINI_HOST.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: Some(api_key.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// OpenAI-compatible settings with the default model
    pub fn openai_compatible(host: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::OpenAICompatible,
            host: host.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Settings for the offline mock backend
    pub fn mock() -> Self {
        Self {
            backend: BackendKind::Mock,
            host: String::new(),
            model: "mock".to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read settings from environment variables
    ///
    /// Fails when the selected backend's required variables are missing.
    pub fn from_env() -> Result<Self> {
        let backend = match env("CHAT_BACKEND") {
            Some(s) => s.parse().map_err(Error::Config)?,
            None => BackendKind::default(),
        };
        Self::from_env_for(backend)
    }

    /// Read settings for a specific backend, ignoring `CHAT_BACKEND`
    pub fn from_env_for(backend: BackendKind) -> Result<Self> {
        let mut config = match backend {
            BackendKind::Gemini => {
                let api_key = env("GEMINI_API_KEY")
                    .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".into()))?;
                let mut config = Self::gemini(api_key);
                if let Some(model) = env("GEMINI_MODEL") {
                    config.model = model;
                }
                if let Some(host) = env("GEMINI_HOST") {
                    config.host = host;
                }
                config
            }
            BackendKind::OpenAICompatible => {
                let host = env("OPENAI_COMPATIBLE_HOST").ok_or_else(|| {
                    Error::Config("OPENAI_COMPATIBLE_HOST is not set".into())
                })?;
                let mut config = Self::openai_compatible(host);
                if let Some(model) = env("OPENAI_COMPATIBLE_MODEL") {
                    config.model = model;
                }
                config.api_key = env("OPENAI_COMPATIBLE_API_KEY");
                config
            }
            BackendKind::Mock => Self::mock(),
        };

        if let Some(secs) = env("CHAT_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| Error::Config(format!("Invalid CHAT_TIMEOUT_SECS: {}", secs)))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Non-empty environment variable
fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Concrete chat client enum
#[derive(Clone)]
pub enum ChatClient {
    /// Google Gemini `generateContent` API
    Gemini(GeminiBackend),
    /// Any server implementing `/v1/chat/completions`
    OpenAICompatible(OpenAICompatibleBackend),
    /// Offline backend for tests and demos
    Mock(MockBackend),
}

impl ChatClient {
    /// Build a client for the configured backend
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let client = match config.backend {
            BackendKind::Gemini => {
                let api_key = config
                    .api_key
                    .as_deref()
                    .ok_or_else(|| Error::Config("Gemini requires an API key".into()))?;
                ChatClient::Gemini(GeminiBackend::new(
                    &config.host,
                    &config.model,
                    api_key,
                    config.timeout,
                )?)
            }
            BackendKind::OpenAICompatible => {
                ChatClient::OpenAICompatible(OpenAICompatibleBackend::new(
                    &config.host,
                    &config.model,
                    config.api_key.as_deref(),
                    config.timeout,
                )?)
            }
            BackendKind::Mock => ChatClient::Mock(MockBackend::new()),
        };

        tracing::debug!(
            backend = %config.backend,
            model = client.model(),
            "Chat client ready"
        );
        Ok(client)
    }

    /// Build a client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ChatConfig::from_env()?)
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ChatClient::Mock(MockBackend::new())
    }

    fn backend(&self) -> &dyn ChatBackend {
        match self {
            ChatClient::Gemini(b) => b,
            ChatClient::OpenAICompatible(b) => b,
            ChatClient::Mock(b) => b,
        }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String> {
        self.backend().complete(prompt).await
    }

    pub fn name(&self) -> &'static str {
        self.backend().name()
    }

    pub fn model(&self) -> &str {
        self.backend().model()
    }
}
