//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::PathBuf;

use tempfile::TempDir;
use vita_core::chat::MockBackend;
use vita_core::{
    BackendKind, ChatClient, ChatSession, EngineConfig, InsightContext, TierScheme,
    FALLBACK_MESSAGE,
};

use crate::commands;

const WEEK: &str = "date,sleep_hours,hydration_ml,steps,mood
2024-05-03,5,2000,3000,sad
2024-05-01,5,2000,3000,sad
2024-05-02,5,2000,3000,sad
2024-05-04,8,2500,6000,happy
";

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ========== Insights Command Tests ==========

#[test]
fn test_run_insights() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "week.csv", WEEK);

    let report = commands::run_insights(&path, EngineConfig::default()).unwrap();
    assert_eq!(report.insights.len(), 4);
    assert!(report.insights[0].starts_with("🚰"));
    assert_eq!(report.predicted_moods.len(), 4);
}

#[test]
fn test_run_insights_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = commands::run_insights(&dir.path().join("nope.csv"), EngineConfig::default())
        .unwrap_err();
    assert!(err.to_string().contains("nope.csv"));
}

#[test]
fn test_run_insights_require_mood() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "no_mood.csv", "date,sleep_hours\n2024-05-01,8\n");

    let config = EngineConfig {
        require_mood: true,
        ..Default::default()
    };
    assert!(commands::run_insights(&path, config).is_err());
    assert!(commands::run_insights(&path, EngineConfig::default()).is_ok());
}

#[test]
fn test_run_insights_collapsed_fallback() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "good.csv",
        "date,sleep_hours,hydration_ml,steps,mood\n2024-05-01,8,2500,9000,happy\n",
    );

    let config = EngineConfig {
        tier_scheme: TierScheme::Collapsed,
        ..Default::default()
    };
    let report = commands::run_insights(&path, config).unwrap();
    assert_eq!(report.insights, vec![FALLBACK_MESSAGE.to_string()]);
}

#[test]
fn test_format_report_plain_and_json() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "week.csv", WEEK);
    let report = commands::run_insights(&path, EngineConfig::default()).unwrap();

    let plain = commands::format_report(&report, false).unwrap();
    assert_eq!(plain.lines().count(), report.insights.len());

    let json: serde_json::Value =
        serde_json::from_str(&commands::format_report(&report, true).unwrap()).unwrap();
    assert_eq!(json["insights"].as_array().unwrap().len(), 4);
    assert_eq!(json["predicted_moods"].as_array().unwrap().len(), 4);
}

// ========== Trends Command Tests ==========

#[test]
fn test_cmd_trends_writes_png() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "week.csv", WEEK);
    let output = dir.path().join("chart.png");

    commands::cmd_trends(&path, &output, EngineConfig::default()).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_cmd_trends_bad_log() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bad.csv", "day,steps\n2024-05-01,100\n");
    let output = dir.path().join("chart.png");

    assert!(commands::cmd_trends(&path, &output, EngineConfig::default()).is_err());
    assert!(!output.exists());
}

#[test]
fn test_cmd_trends_honours_require_mood() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "no_mood.csv", "date,steps\n2024-05-01,100\n");
    let output = dir.path().join("chart.png");

    let strict = EngineConfig {
        require_mood: true,
        ..Default::default()
    };
    let err = commands::cmd_trends(&path, &output, strict).unwrap_err();
    assert!(err.to_string().contains("mood"));
    assert!(!output.exists());

    commands::cmd_trends(&path, &output, EngineConfig::default()).unwrap();
    assert!(output.exists());
}

// ========== Serve Command Tests ==========

#[test]
fn test_server_config_overrides() {
    let config = commands::server_config(
        vita_server::ServerConfig::default(),
        Some("127.0.0.1".into()),
        Some(8080),
        Some("http://a.test,http://b.test"),
    );
    assert_eq!(config.addr(), "127.0.0.1:8080");
    assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
}

#[test]
fn test_server_config_keeps_defaults() {
    let config =
        commands::server_config(vita_server::ServerConfig::default(), None, None, None);
    assert_eq!(config.addr(), "0.0.0.0:10000");
    assert_eq!(
        config.allowed_origins,
        vec![vita_server::DEFAULT_ALLOWED_ORIGIN]
    );
}

// ========== Chat Command Tests ==========

#[test]
fn test_chat_config_mock_backend() {
    let config = commands::chat_config(Some(BackendKind::Mock), Some("tiny".into())).unwrap();
    assert_eq!(config.backend, BackendKind::Mock);
    assert_eq!(config.model, "tiny");
}

#[tokio::test]
async fn test_run_chat_loop() {
    let mut session = ChatSession::new(ChatClient::mock());
    let input: &[u8] = b"how much water?\n\n  \nexit\nnever sent\n";
    let mut output = Vec::new();

    commands::run_chat(&mut session, input, &mut output)
        .await
        .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("🔍 Echo: how much water?"));
    assert!(!output.contains("never sent"));
    assert_eq!(session.conversation().len(), 2);
}

#[tokio::test]
async fn test_run_chat_stops_at_eof() {
    let mut session = ChatSession::new(ChatClient::mock());
    let input: &[u8] = b"one\ntwo";
    let mut output = Vec::new();

    commands::run_chat(&mut session, input, &mut output)
        .await
        .unwrap();

    assert_eq!(session.conversation().len(), 4);
}

#[tokio::test]
async fn test_run_chat_backend_failure_is_reported() {
    let mut session = ChatSession::new(ChatClient::Mock(MockBackend::failing()));
    let input: &[u8] = b"hello\nquit\n";
    let mut output = Vec::new();

    commands::run_chat(&mut session, input, &mut output)
        .await
        .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("⚠️ Mock API error: mock failure"));
}

#[tokio::test]
async fn test_export_transcript_with_context() {
    let dir = TempDir::new().unwrap();
    let context_path = write_file(&dir, "notes.txt", "Slept badly all week");
    let context = InsightContext::from_path(&context_path).unwrap();

    let mut session = ChatSession::new(ChatClient::mock()).with_context(context);
    session.ask("any tips?").await;

    let transcript = dir.path().join("chat.txt");
    commands::export_transcript(&session, &transcript).unwrap();

    let text = std::fs::read_to_string(&transcript).unwrap();
    assert_eq!(text, "❓ any tips?\n\n🔍 Echo: any tips?\n\n");
}
