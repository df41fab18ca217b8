//! Chat command implementation

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use vita_core::{BackendKind, ChatClient, ChatConfig, ChatSession, InsightContext};

/// Resolve chat settings from the environment plus flag overrides
pub fn chat_config(backend: Option<BackendKind>, model: Option<String>) -> Result<ChatConfig> {
    let mut config = match backend {
        Some(kind) => ChatConfig::from_env_for(kind)?,
        None => ChatConfig::from_env()?,
    };
    if let Some(model) = model {
        config.model = model;
    }
    Ok(config)
}

pub async fn cmd_chat(
    context: Option<&Path>,
    backend: Option<BackendKind>,
    model: Option<String>,
    export: Option<&Path>,
) -> Result<()> {
    let config = chat_config(backend, model)?;
    let client = ChatClient::from_config(&config).context("Failed to set up chat backend")?;
    let mut session = ChatSession::new(client);

    if let Some(path) = context {
        let insights = InsightContext::from_path(path)
            .with_context(|| format!("Failed to load context from {}", path.display()))?;
        println!("📎 Loaded {} context from {}", insights.kind(), path.display());
        session.set_context(Some(insights));
    }

    println!(
        "💬 Vita health coach ({} / {}). Type 'exit' to quit.",
        session.client().name(),
        session.client().model()
    );
    println!();

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_chat(&mut session, stdin, &mut std::io::stdout()).await?;

    if let Some(path) = export {
        export_transcript(&session, path)?;
        println!("💾 Transcript saved to {}", path.display());
    }

    Ok(())
}

/// Read messages line by line until EOF or `exit`/`quit`
pub async fn run_chat<R, W>(session: &mut ChatSession, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(output, "❓ ")?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            break;
        };

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        let reply = session.ask(message).await;
        writeln!(output, "🔍 {}", reply)?;
        writeln!(output)?;
    }
    Ok(())
}

/// Write the conversation as plain text
pub fn export_transcript(session: &ChatSession, path: &Path) -> Result<()> {
    std::fs::write(path, session.conversation().export_text())
        .with_context(|| format!("Failed to write {}", path.display()))
}
