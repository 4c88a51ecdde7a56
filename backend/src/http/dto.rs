//! Data Transfer Objects for the HTTP API.
//!
//! Request and response bodies of the manifest and chart endpoints live in
//! [`crate::routes`]; this module re-exports them next to the HTTP-only types.

use serde::{Deserialize, Serialize};

pub use crate::models::ManifestData;
pub use crate::routes::charts::{AssistantRenderRequest, ChartRequest, ManifestRef};
pub use crate::routes::manifests::{ManifestListQuery, ManifestPage};
pub use crate::services::{AssistantRender, ChartRender};

/// Query parameters of `GET /api/get-manifest`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ManifestIdQuery {
    #[serde(default)]
    pub manifest_id: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Manifest source reachability
    pub upstream: String,
    /// Manifest source implementation (`http` or `local`)
    pub source: String,
}
