//! Manifest source trait.

use async_trait::async_trait;
use serde_json::Value;

use super::error::UpstreamResult;
use crate::routes::manifests::{ManifestListQuery, ManifestPage};

/// Read access to raw manifest documents.
///
/// Documents are returned exactly as the external API stores them; turning
/// them into [`ManifestData`](crate::models::ManifestData) is the
/// aggregator's job.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to be shared by request handlers.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// List one page of manifests.
    ///
    /// The query is expected to be [sanitized](ManifestListQuery::sanitized).
    async fn list_manifests(&self, query: &ManifestListQuery) -> UpstreamResult<ManifestPage>;

    /// Fetch one raw manifest document by id.
    ///
    /// # Errors
    /// * `UpstreamError::NotFound` when the id is unknown
    /// * `UpstreamError::Status` when the external API rejects the request
    async fn fetch_manifest(&self, id: &str) -> UpstreamResult<Value>;

    /// Whether the source is reachable.
    async fn health_check(&self) -> UpstreamResult<bool>;

    /// Short name for logs and the health endpoint.
    fn kind(&self) -> &'static str;
}
