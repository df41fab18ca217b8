//! Mock backend for testing
//!
//! Replies without any network access. Useful for unit tests, demos and
//! running the chat loop offline.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::ChatBackend;

/// Mock chat backend
///
/// Echoes the last `User:` line of the prompt, or fails every call when
/// created with [`MockBackend::failing`].
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether every call should fail
    pub fail: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A backend whose calls always fail with an API error
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

/// Text of the last `User:` line in a prompt
pub(crate) fn last_user_line(prompt: &str) -> &str {
    prompt
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("User: "))
        .unwrap_or("")
        .trim()
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.fail {
            return Err(Error::Api {
                backend: self.name().to_string(),
                message: "mock failure".into(),
            });
        }
        Ok(format!("Echo: {}", last_user_line(prompt)))
    }

    fn name(&self) -> &'static str {
        "Mock"
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_user_line() {
        let prompt = "System\n\nUser: first\nVita: ok\nUser: second\nVita:";
        assert_eq!(last_user_line(prompt), "second");
        assert_eq!(last_user_line("no turns"), "");
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let err = MockBackend::failing().complete("User: hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Mock API error: mock failure");
    }
}
