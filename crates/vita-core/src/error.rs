//! Error types for Vita

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing 'date' column in health log")]
    MissingDateColumn,

    #[error("Unable to parse date on row {row}: '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Missing '{0}' column for training.")]
    MissingColumn(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Chart rendering error: {0}")]
    Chart(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{backend} API error: {message}")]
    Api { backend: String, message: String },
}

impl Error {
    /// Whether this error was caused by the uploaded data itself (bad
    /// dates, malformed CSV, non-numeric cells) rather than by the server.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::Csv(_)
                | Error::MissingDateColumn
                | Error::InvalidDate { .. }
                | Error::InvalidData(_)
                | Error::MissingColumn(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_classification() {
        assert!(Error::MissingDateColumn.is_load_error());
        assert!(Error::InvalidDate {
            row: 2,
            value: "yesterday".into()
        }
        .is_load_error());
        assert!(Error::InvalidData("bad".into()).is_load_error());
        assert!(!Error::Training("diverged".into()).is_load_error());
        assert!(!Error::Chart("backend".into()).is_load_error());
    }

    #[test]
    fn test_missing_column_message() {
        let err = Error::MissingColumn("mood".into());
        assert_eq!(err.to_string(), "Missing 'mood' column for training.");
    }
}
