//! HTTP handlers for the REST API.
//!
//! Handlers fetch raw documents through the manifest source and hand them to
//! the service layer; none of them holds state between requests.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use super::dto::{
    AssistantRender, AssistantRenderRequest, ChartRender, ChartRequest, HealthResponse,
    ManifestData, ManifestIdQuery, ManifestListQuery, ManifestPage, ManifestRef,
};
use super::error::AppError;
use super::state::AppState;
use crate::services::{self, ChartSpec};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the manifest
/// source is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let upstream = match state.source.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream,
        source: state.source.kind().to_string(),
    }))
}

// =============================================================================
// Manifests
// =============================================================================

/// GET /api/get-manifests
///
/// One page of raw manifests, filtered and sorted by the upstream.
pub async fn list_manifests(
    State(state): State<AppState>,
    Query(query): Query<ManifestListQuery>,
) -> HandlerResult<ManifestPage> {
    let query = query.sanitized();
    let page = state.source.list_manifests(&query).await?;
    Ok(Json(page))
}

/// GET /api/get-manifest?manifestId=<id>
///
/// One raw manifest document, exactly as stored upstream.
pub async fn get_manifest(
    State(state): State<AppState>,
    Query(query): Query<ManifestIdQuery>,
) -> HandlerResult<Value> {
    let id = query
        .manifest_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("manifestId is required".to_string()))?;
    let document = state.source.fetch_manifest(&id).await?;
    Ok(Json(document))
}

/// GET /api/manifests/{id}
///
/// One manifest reshaped into shipments, ULD contents and house shipments.
pub async fn get_transformed_manifest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<ManifestData> {
    let document = state.source.fetch_manifest(&id).await?;
    Ok(Json(services::transform_manifest(&document)))
}

// =============================================================================
// Charts
// =============================================================================

async fn resolve_manifest(state: &AppState, target: &ManifestRef) -> Result<ManifestData, AppError> {
    if let Some(document) = &target.manifest {
        return Ok(services::transform_manifest(document));
    }
    match target.manifest_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => {
            let document = state.source.fetch_manifest(id).await?;
            Ok(services::transform_manifest(&document))
        }
        _ => Err(AppError::BadRequest(
            "either manifestId or manifest is required".to_string(),
        )),
    }
}

/// POST /api/chart
///
/// Render one chart specification against a manifest.
pub async fn render_chart(
    State(state): State<AppState>,
    Json(request): Json<ChartRequest>,
) -> HandlerResult<ChartRender> {
    let spec = ChartSpec::from_json(&request.spec)?;
    let manifest = resolve_manifest(&state, &request.target).await?;
    let render = services::render_chart(&manifest, &spec)?;
    Ok(Json(render))
}

/// POST /api/assistant/render
///
/// Split an assistant reply into prose and charts. Failures never surface
/// as errors; the client gets an apology and the conversation continues.
pub async fn render_assistant_reply(
    State(state): State<AppState>,
    Json(request): Json<AssistantRenderRequest>,
) -> Json<AssistantRender> {
    match resolve_manifest(&state, &request.target).await {
        Ok(manifest) => Json(services::render_reply(&manifest, &request.reply)),
        Err(e) => {
            tracing::warn!(error = ?e, "assistant render failed");
            Json(AssistantRender::apology())
        }
    }
}
