//! Vita CLI - Personal health insights
//!
//! Usage:
//!   vita insights log.csv            Print insights for a health log
//!   vita trends log.csv -o out.png   Render the trend chart
//!   vita serve --port 10000          Start the upload server
//!   vita chat --context notes.json   Chat with the health coach

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vita_core::EngineConfig;

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Insights {
            file,
            scheme,
            require_mood,
            json,
        } => {
            let mut config = EngineConfig::from_env()?;
            if let Some(scheme) = scheme {
                config.tier_scheme = scheme;
            }
            config.require_mood |= require_mood;
            commands::cmd_insights(&file, config, json)
        }
        Commands::Trends { file, output } => {
            commands::cmd_trends(&file, &output, EngineConfig::from_env()?)
        }
        Commands::Serve {
            host,
            port,
            allowed_origins,
        } => commands::cmd_serve(host, port, allowed_origins.as_deref()).await,
        Commands::Chat {
            context,
            backend,
            model,
            export,
        } => {
            commands::cmd_chat(context.as_deref(), backend, model, export.as_deref()).await
        }
    }
}
