//! Health log loading and validation
//!
//! Parses a dated CSV log into a [`HealthLog`] sorted by date. Only the
//! `date` column is required; `sleep_hours`, `hydration_ml`, `steps` and
//! `mood` are optional and each downstream rule checks for its own column.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{DailyRecord, Metric, DATE_COLUMN, MOOD_COLUMN};

/// A date-sorted table of daily health records
#[derive(Debug, Clone, Default)]
pub struct HealthLog {
    records: Vec<DailyRecord>,
    /// Metric columns that hold at least one value, in feature order
    metrics: Vec<Metric>,
    has_mood: bool,
}

impl HealthLog {
    /// Build a log from records, sorting by date and detecting columns
    ///
    /// A column counts as present when at least one record has a value for it.
    pub fn from_records(mut records: Vec<DailyRecord>) -> Self {
        records.sort_by_key(|r| r.date);

        let metrics = Metric::ALL
            .into_iter()
            .filter(|m| records.iter().any(|r| r.value(*m).is_some()))
            .collect();
        let has_mood = records.iter().any(|r| r.mood.is_some());

        Self {
            records,
            metrics,
            has_mood,
        }
    }

    /// Load a log from a CSV file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Parse CSV data into a log
    ///
    /// Fails if the `date` column is missing, a date is unparsable, or a
    /// numeric cell is not a non-negative number. Missing optional columns and
    /// empty cells are tolerated.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let columns = ColumnIndex::from_headers(&headers)?;

        let mut records = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            // Row 1 is the header
            let row = i + 2;

            let date = parse_date(record.get(columns.date).unwrap_or(""), row)?;
            let mut daily = DailyRecord::new(date);

            for (metric, idx) in &columns.metrics {
                let value = parse_metric(record.get(*idx), *metric, row)?;
                daily.set_value(*metric, value);
            }

            daily.mood = columns
                .mood
                .and_then(|idx| record.get(idx))
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());

            records.push(daily);
        }

        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.date) {
                warn!(date = %record.date, "Duplicate date in health log");
            }
        }

        let log = Self::from_records(records);
        debug!(
            rows = log.len(),
            metrics = ?log.metrics,
            has_mood = log.has_mood,
            "Parsed health log"
        );
        Ok(log)
    }

    /// Records in ascending date order
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a metric column is present
    pub fn has_metric(&self, metric: Metric) -> bool {
        self.metrics.contains(&metric)
    }

    /// Whether the mood column is present
    pub fn has_mood(&self) -> bool {
        self.has_mood
    }

    /// Present metric columns in feature order (sleep, hydration, steps)
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// All logged values of a metric, skipping empty cells
    pub fn values(&self, metric: Metric) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().filter_map(move |r| r.value(metric))
    }

    /// Number of days where a metric was logged below a threshold
    pub fn count_below(&self, metric: Metric, threshold: f64) -> usize {
        self.values(metric).filter(|v| *v < threshold).count()
    }

    /// Arithmetic mean of a metric, or `None` if it has no values
    pub fn mean(&self, metric: Metric) -> Option<f64> {
        let (sum, count) = self
            .values(metric)
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// First and last logged dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.records.first()?.date, self.records.last()?.date))
    }
}

/// Header positions of the columns we understand
struct ColumnIndex {
    date: usize,
    metrics: Vec<(Metric, usize)>,
    mood: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let date = position(DATE_COLUMN).ok_or(Error::MissingDateColumn)?;
        let metrics = Metric::ALL
            .into_iter()
            .filter_map(|m| position(m.as_str()).map(|idx| (m, idx)))
            .collect();
        let mood = position(MOOD_COLUMN);

        Ok(Self {
            date,
            metrics,
            mood,
        })
    }
}

/// Parse a date cell, accepting ISO dates, timestamps and US/EU formats
fn parse_date(s: &str, row: usize) -> Result<NaiveDate> {
    let s = s.trim();

    // %Y also accepts two-digit years, so %y goes first
    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%y", // 01/15/24
        "%m/%d/%Y", // 01/15/2024
        "%m-%d-%Y", // 01-15-2024
        "%d/%m/%Y", // 15/01/2024 (European)
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(datetime.date());
        }
    }

    Err(Error::InvalidDate {
        row,
        value: s.to_string(),
    })
}

/// Parse a numeric cell; empty and NaN cells are missing values
fn parse_metric(cell: Option<&str>, metric: Metric, row: usize) -> Result<Option<f64>> {
    let Some(s) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let value: f64 = s.parse().map_err(|_| {
        Error::InvalidData(format!(
            "Invalid {} value on row {}: '{}'",
            metric, row, s
        ))
    })?;

    if value.is_nan() {
        return Ok(None);
    }
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidData(format!(
            "{} must be a non-negative number on row {}: '{}'",
            metric, row, s
        )));
    }

    Ok(Some(value))
}
