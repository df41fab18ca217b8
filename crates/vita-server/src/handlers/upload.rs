//! Health log upload handler

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

use vita_core::{render_trend_chart, HealthLog, InsightEngine};

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};

/// Successful upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Insight messages in rule order
    pub insights: Vec<String>,
    /// Base64-encoded PNG trend chart
    pub trend_image: String,
}

/// Analyse an uploaded health log
///
/// Expects multipart form with:
/// - file: CSV file (required, max 10MB, name ending in `.csv`)
pub async fn upload_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;

        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(AppError::bad_request(&format!(
                "File too large. Maximum size is {} MB",
                MAX_UPLOAD_SIZE / 1024 / 1024
            )));
        }

        if !filename.is_empty() {
            upload = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, data) = upload.ok_or_else(|| AppError::bad_request("No file uploaded"))?;
    if !filename.to_lowercase().ends_with(".csv") {
        return Err(AppError::bad_request("Only CSV files allowed"));
    }

    info!(filename = %filename, bytes = data.len(), "Processing health log upload");

    let engine_config = state.config.engine;
    let (insights, png) = tokio::task::spawn_blocking(move || -> vita_core::Result<_> {
        let log = HealthLog::from_reader(data.as_slice())?;
        let report = InsightEngine::with_config(engine_config).analyze(&log)?;
        let png = render_trend_chart(&log, &report.predicted_moods)?;
        Ok((report.insights, png))
    })
    .await??;

    info!(insights = insights.len(), "Upload analysed");

    Ok(Json(UploadResponse {
        insights,
        trend_image: base64::engine::general_purpose::STANDARD.encode(png),
    }))
}
