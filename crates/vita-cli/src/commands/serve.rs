//! Server command implementation

use anyhow::Result;
use vita_server::ServerConfig;

/// Merge flag overrides into an environment-derived config
pub fn server_config(
    mut config: ServerConfig,
    host: Option<String>,
    port: Option<u16>,
    allowed_origins: Option<&str>,
) -> ServerConfig {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(origins) = allowed_origins {
        config.allowed_origins = vita_server::parse_origins(origins);
    }
    config
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    allowed_origins: Option<&str>,
) -> Result<()> {
    let config = server_config(ServerConfig::from_env()?, host, port, allowed_origins);

    println!("🚀 Starting Vita upload server...");
    println!("   Listening: http://{}", config.addr());
    println!("   Upload: POST /upload-csv/ (field `file`, max 10 MB)");
    println!("   Tier scheme: {}", config.engine.tier_scheme);
    if config.allowed_origins.is_empty() {
        println!("   ⚠️  No CORS origins configured - browsers will be blocked");
    } else {
        println!("   CORS origins: {}", config.allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    vita_server::serve(config).await
}
