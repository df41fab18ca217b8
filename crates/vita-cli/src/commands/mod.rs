//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `insights` - Insight generation for a health log
//! - `trends` - Trend chart rendering
//! - `serve` - Web server command
//! - `chat` - Interactive health coach chat

pub mod chat;
pub mod insights;
pub mod serve;
pub mod trends;

// Re-export command functions for main.rs
pub use chat::*;
pub use insights::*;
pub use serve::*;
pub use trends::*;

use std::path::Path;

use anyhow::{Context, Result};
use vita_core::HealthLog;

/// Load a health log, naming the file in any error
pub fn load_log(path: &Path) -> Result<HealthLog> {
    HealthLog::from_path(path).with_context(|| format!("Failed to load {}", path.display()))
}
