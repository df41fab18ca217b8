//! Trend chart command implementation

use std::path::Path;

use anyhow::{Context, Result};
use vita_core::{render_trend_chart, EngineConfig, InsightEngine};

use super::load_log;

/// Render the chart with the same engine settings `insights` uses
pub fn cmd_trends(file: &Path, output: &Path, config: EngineConfig) -> Result<()> {
    let log = load_log(file)?;
    let report = InsightEngine::with_config(config).analyze(&log)?;
    let png = render_trend_chart(&log, &report.predicted_moods)?;

    std::fs::write(output, &png)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("📈 Trend chart for {} days written to {}", log.len(), output.display());
    Ok(())
}
