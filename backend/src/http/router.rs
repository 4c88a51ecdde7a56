//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::routes::{charts, manifests, HEALTH};

/// Inline manifests in chart requests can be large.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(HEALTH, get(handlers::health_check))
        // Manifest proxy
        .route(manifests::GET_MANIFESTS, get(handlers::list_manifests))
        .route(manifests::GET_MANIFEST, get(handlers::get_manifest))
        .route(
            manifests::GET_TRANSFORMED_MANIFEST,
            get(handlers::get_transformed_manifest),
        )
        // Chart engine
        .route(charts::POST_CHART, post(handlers::render_chart))
        .route(
            charts::POST_ASSISTANT_RENDER,
            post(handlers::render_assistant_reply),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
