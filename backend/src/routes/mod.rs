//! Route paths and the request/response types of each endpoint group.

pub mod charts;
pub mod manifests;

pub const HEALTH: &str = "/health";

#[cfg(test)]
mod tests {
    #[test]
    fn test_module_structure() {
        assert_eq!(super::HEALTH, "/health");
        assert_eq!(super::manifests::GET_MANIFESTS, "/api/get-manifests");
        assert_eq!(super::manifests::GET_MANIFEST, "/api/get-manifest");
        assert_eq!(
            super::manifests::GET_TRANSFORMED_MANIFEST,
            "/api/manifests/{id}"
        );
        assert_eq!(super::charts::POST_CHART, "/api/chart");
        assert_eq!(
            super::charts::POST_ASSISTANT_RENDER,
            "/api/assistant/render"
        );
    }
}
