//! Vita Web Server
//!
//! Axum-based REST API for the Vita health insights pipeline.
//!
//! A client uploads a daily health log as CSV and receives the generated
//! insight messages together with a base64 PNG trend chart:
//! - `POST /upload-csv/` (multipart field `file`, max 10 MB)
//! - `GET /health`
//!
//! The CPU-bound pipeline (load, train, rules, chart) runs on the blocking
//! thread pool so it never stalls the async executor.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use vita_core::EngineConfig;

mod handlers;

pub use handlers::UploadResponse;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Extra room for multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins (`*` allows any origin)
    pub allowed_origins: Vec<String>,
    /// Insight engine settings used for every upload
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from environment variables
    ///
    /// - `VITA_HOST` (default 0.0.0.0)
    /// - `PORT` (default 10000)
    /// - `VITA_ALLOWED_ORIGINS`: comma-separated (default http://localhost:3000)
    /// - `VITA_TIER_SCHEME`, `VITA_REQUIRE_MOOD`: see [`EngineConfig::from_env`]
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("VITA_HOST") {
            if !host.trim().is_empty() {
                config.host = host.trim().to_string();
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT: {}", port))?;
        }
        if let Ok(origins) = std::env::var("VITA_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&origins);
        }
        config.engine = EngineConfig::from_env()?;

        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a comma-separated origin list
pub fn parse_origins(s: &str) -> Vec<String> {
    s.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(config: ServerConfig) -> Router {
    let cors = build_cors(&config.allowed_origins);
    let state = Arc::new(AppState { config });

    Router::new()
        .route("/upload-csv/", post(handlers::upload_csv))
        .route("/upload-csv", post(handlers::upload_csv))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + MULTIPART_OVERHEAD))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Start the server
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.addr();
    info!(
        tier_scheme = %config.engine.tier_scheme,
        require_mood = config.engine.require_mood,
        origins = ?config.allowed_origins,
        "Insight engine configured"
    );

    let app = create_router(config);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

pub struct AppError {
    status: StatusCode,
    message: String,
    /// Detail string returned to the client alongside 5xx errors
    details: Option<String>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            details: None,
        }
    }

    pub fn internal(details: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self.details {
            Some(details) => {
                error!(status = %self.status, details = %details, "Internal error");
                serde_json::json!({ "error": self.message, "details": details })
            }
            None => serde_json::json!({ "error": self.message }),
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<vita_core::Error> for AppError {
    fn from(err: vita_core::Error) -> Self {
        if err.is_load_error() {
            Self::bad_request(&err.to_string())
        } else {
            Self::internal(&err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(&err.to_string())
    }
}
