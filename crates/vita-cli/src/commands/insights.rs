//! Insight command implementation

use std::path::Path;

use anyhow::Result;
use vita_core::{EngineConfig, InsightEngine, InsightReport};

use super::load_log;

pub fn cmd_insights(file: &Path, config: EngineConfig, json: bool) -> Result<()> {
    let report = run_insights(file, config)?;
    print!("{}", format_report(&report, json)?);
    Ok(())
}

/// Load a log and run the insight engine over it
pub fn run_insights(file: &Path, config: EngineConfig) -> Result<InsightReport> {
    let log = load_log(file)?;
    let report = InsightEngine::with_config(config).analyze(&log)?;
    Ok(report)
}

/// Render a report as plain lines or pretty JSON
pub fn format_report(report: &InsightReport, json: bool) -> Result<String> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(report)?));
    }

    let mut out = String::new();
    for insight in &report.insights {
        out.push_str(insight);
        out.push('\n');
    }
    Ok(out)
}
