//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vita_core::{BackendKind, TierScheme};

/// Vita - Personal health insights from your daily log
#[derive(Parser)]
#[command(name = "vita")]
#[command(about = "Health log insights, trend charts and a coaching chat", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate insights from a health log CSV
    Insights {
        /// CSV file with a `date` column and optional sleep_hours,
        /// hydration_ml, steps and mood columns
        file: PathBuf,

        /// Tier scheme: graded or collapsed (overrides VITA_TIER_SCHEME)
        #[arg(long)]
        scheme: Option<TierScheme>,

        /// Fail when the mood column is missing (overrides VITA_REQUIRE_MOOD)
        #[arg(long)]
        require_mood: bool,

        /// Print insights and mood predictions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the trend chart for a health log as PNG
    Trends {
        /// CSV file to chart
        file: PathBuf,

        /// Output PNG path
        #[arg(short, long, default_value = "trends.png")]
        output: PathBuf,
    },

    /// Start the upload server
    Serve {
        /// Host to bind to (overrides VITA_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Comma-separated CORS origins, `*` for any (overrides VITA_ALLOWED_ORIGINS)
        #[arg(long)]
        allowed_origins: Option<String>,
    },

    /// Chat with the Vita health coach
    Chat {
        /// Insight context file (.txt, .json or .csv)
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// Chat backend: gemini, openai_compatible or mock (overrides CHAT_BACKEND)
        #[arg(short, long)]
        backend: Option<BackendKind>,

        /// Model name (overrides the backend's model variable)
        #[arg(short, long)]
        model: Option<String>,

        /// Write the transcript to this file when the chat ends
        #[arg(long)]
        export: Option<PathBuf>,
    },
}
