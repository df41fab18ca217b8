//! Insight context attached to chat prompts
//!
//! Users can hand the coach their generated insights as plain text, as
//! structured JSON, or as a CSV table. The payload is resolved once, when
//! the file is loaded, and rendered as a single prompt line per turn.

use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};

/// A CSV table kept as strings for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl InsightTable {
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.iter().map(String::from).collect();
        let rows = rdr
            .records()
            .map(|r| Ok(r?.iter().map(String::from).collect()))
            .collect::<Result<Vec<Vec<String>>>>()?;

        Ok(Self { headers, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a fixed-width text table, one line per row
    pub fn render(&self) -> String {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0; columns];
        for row in std::iter::once(&self.headers).chain(&self.rows) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        std::iter::once(&self.headers)
            .chain(&self.rows)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Insight payload attached to each chat prompt
#[derive(Debug, Clone, PartialEq)]
pub enum InsightContext {
    /// Free text, e.g. a saved list of insight messages
    Text(String),
    /// Any JSON document
    StructuredInsights(Value),
    /// A health log or insight table
    Table(InsightTable),
}

impl InsightContext {
    /// Load a context file, choosing the format by extension
    ///
    /// `.txt` is read as text, `.json` as JSON and `.csv` as a table.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let context = match extension.as_str() {
            "txt" => InsightContext::Text(std::fs::read_to_string(path)?),
            "json" => InsightContext::StructuredInsights(serde_json::from_str(
                &std::fs::read_to_string(path)?,
            )?),
            "csv" => InsightContext::Table(InsightTable::from_reader(std::fs::File::open(path)?)?),
            _ => {
                return Err(Error::InvalidData(format!(
                    "Unsupported insight file (expected .txt, .json or .csv): {}",
                    path.display()
                )))
            }
        };

        tracing::debug!(path = %path.display(), kind = context.kind(), "Loaded insight context");
        Ok(context)
    }

    /// Structured context from generated insight messages
    pub fn from_insights(insights: &[String]) -> Self {
        InsightContext::StructuredInsights(serde_json::json!({ "insights": insights }))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InsightContext::Text(_) => "text",
            InsightContext::StructuredInsights(_) => "json",
            InsightContext::Table(_) => "table",
        }
    }

    /// The `User Insights` line added to the prompt, if there is anything to add
    pub fn prompt_line(&self) -> Option<String> {
        match self {
            InsightContext::Text(text) => Some(format!("User Insights: {}", text)),
            InsightContext::StructuredInsights(value) => {
                Some(format!("User Insights: {}", value))
            }
            InsightContext::Table(table) if table.is_empty() => None,
            InsightContext::Table(table) => {
                Some(format!("User Insights (Health Log): {}", table.render()))
            }
        }
    }
}
