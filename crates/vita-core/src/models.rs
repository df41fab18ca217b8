//! Data models for Vita

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column name of the required date column
pub const DATE_COLUMN: &str = "date";

/// Column name of the categorical mood label
pub const MOOD_COLUMN: &str = "mood";

/// Numeric daily metrics tracked in a health log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Hours slept
    SleepHours,
    /// Water intake in millilitres
    HydrationMl,
    /// Step count
    Steps,
}

impl Metric {
    /// All metrics in feature order (sleep, hydration, steps)
    pub const ALL: [Metric; 3] = [Metric::SleepHours, Metric::HydrationMl, Metric::Steps];

    /// CSV column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::SleepHours => "sleep_hours",
            Metric::HydrationMl => "hydration_ml",
            Metric::Steps => "steps",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sleep_hours" => Ok(Metric::SleepHours),
            "hydration_ml" => Ok(Metric::HydrationMl),
            "steps" => Ok(Metric::Steps),
            _ => Err(format!("Unknown metric: {}", s)),
        }
    }
}

/// One day of logged health data
///
/// Metric values are `None` when the column is absent or the cell is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub sleep_hours: Option<f64>,
    pub hydration_ml: Option<f64>,
    pub steps: Option<f64>,
    pub mood: Option<String>,
}

impl DailyRecord {
    /// Create an empty record for a date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sleep_hours: None,
            hydration_ml: None,
            steps: None,
            mood: None,
        }
    }

    /// Value of a metric for this day
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::SleepHours => self.sleep_hours,
            Metric::HydrationMl => self.hydration_ml,
            Metric::Steps => self.steps,
        }
    }

    /// Set a metric value
    pub fn set_value(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::SleepHours => self.sleep_hours = value,
            Metric::HydrationMl => self.hydration_ml = value,
            Metric::Steps => self.steps = value,
        }
    }

    /// Feature vector for the given metrics, or `None` if any value is missing
    pub fn features(&self, metrics: &[Metric]) -> Option<Vec<f64>> {
        metrics.iter().map(|m| self.value(*m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_round_trip_names() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_str(metric.as_str()).unwrap(), metric);
        }
        assert!(Metric::from_str("calories").is_err());
    }

    #[test]
    fn test_features_requires_all_values() {
        let mut record = DailyRecord::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        record.sleep_hours = Some(7.5);
        record.steps = Some(8000.0);

        assert_eq!(
            record.features(&[Metric::SleepHours, Metric::Steps]),
            Some(vec![7.5, 8000.0])
        );
        assert_eq!(record.features(&Metric::ALL), None);
    }
}
