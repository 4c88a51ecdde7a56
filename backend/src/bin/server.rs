//! Manifest Viewer HTTP Server Binary
//!
//! This is the main entry point for the manifest viewer REST API server.
//! It builds the manifest source, sets up the HTTP router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! # Run against the external manifest API
//! MANIFEST_API_URL=https://manifests.example.com MANIFEST_API_KEY=... \
//!   cargo run --bin manifest-server
//!
//! # Run with an in-memory source seeded from a file
//! MANIFEST_SOURCE=local MANIFEST_SEED_FILE=manifests.json cargo run --bin manifest-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log level (default: info)
//! - `MANIFEST_*`: manifest source settings, see `UpstreamConfig::from_env`

use std::env;
use std::net::SocketAddr;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use manifest_viewer::http::{create_router, AppState};
use manifest_viewer::upstream::{SourceFactory, UpstreamConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting manifest viewer HTTP server");

    let config = UpstreamConfig::load()?;
    let source = SourceFactory::create(&config)?;
    info!(source = source.kind(), "Manifest source initialized");

    // Create application state
    let state = AppState::new(source);

    // Create router with all endpoints
    let app = create_router(state);

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
