use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const POST_CHART: &str = "/api/chart";
pub const POST_ASSISTANT_RENDER: &str = "/api/assistant/render";

/// Where the manifest for a chart comes from.
///
/// `manifest` is a raw upstream document and wins over `manifestId`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRef {
    #[serde(default)]
    pub manifest_id: Option<String>,
    #[serde(default)]
    pub manifest: Option<Value>,
}

/// `POST /api/chart` body.
///
/// `spec` stays untyped until the handler validates it so that a malformed
/// specification is reported like any other invalid chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    #[serde(flatten)]
    pub target: ManifestRef,
    pub spec: Value,
}

/// `POST /api/assistant/render` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantRenderRequest {
    #[serde(flatten)]
    pub target: ManifestRef,
    #[serde(default)]
    pub reply: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chart_request_by_id() {
        let req: ChartRequest = serde_json::from_value(json!({
            "manifestId": "m1",
            "spec": {"chartType": "bar"}
        }))
        .unwrap();
        assert_eq!(req.target.manifest_id.as_deref(), Some("m1"));
        assert!(req.target.manifest.is_none());
        assert_eq!(req.spec["chartType"], "bar");
    }

    #[test]
    fn test_assistant_request_inline_manifest() {
        let req: AssistantRenderRequest = serde_json::from_value(json!({
            "manifest": {"id": "m2"},
            "reply": "hello"
        }))
        .unwrap();
        assert!(req.target.manifest_id.is_none());
        assert_eq!(req.target.manifest, Some(json!({"id": "m2"})));
        assert_eq!(req.reply, "hello");
    }
}
