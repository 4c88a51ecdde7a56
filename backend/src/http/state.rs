//! Application state for the HTTP server.

use std::sync::Arc;

use crate::upstream::ManifestSource;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Where raw manifest documents come from
    pub source: Arc<dyn ManifestSource>,
}

impl AppState {
    /// Create a new application state with the given manifest source.
    pub fn new(source: Arc<dyn ManifestSource>) -> Self {
        Self { source }
    }
}
