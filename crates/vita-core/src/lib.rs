//! Vita Core Library
//!
//! Shared functionality for the Vita personal health tool:
//! - Health log CSV loading and validation
//! - Per-log mood classifier (multinomial logistic regression)
//! - Graded insight rules and the insight engine
//! - Trend chart rendering
//! - Pluggable chat backends for the health coach (Gemini, OpenAI-compatible)

pub mod chat;
pub mod classifier;
pub mod error;
pub mod health_log;
pub mod insights;
pub mod models;
pub mod trends;

/// Test utilities including mock chat server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use chat::{
    BackendKind, ChatBackend, ChatClient, ChatConfig, ChatSession, Conversation, InsightContext,
    Speaker,
};
pub use classifier::{MoodClassifier, MoodEncoder, MoodModel};
pub use error::{Error, Result};
pub use health_log::HealthLog;
pub use insights::{
    generate_insights, EngineConfig, InsightEngine, InsightReport, TierScheme, FALLBACK_MESSAGE,
};
pub use models::{DailyRecord, Metric};
pub use trends::render_trend_chart;
