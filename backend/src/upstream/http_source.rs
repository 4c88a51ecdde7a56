//! External manifest API client.
//!
//! The API is a Payload-style REST collection: `GET /api/{collection}` lists
//! documents with `where[...]` filters and `GET /api/{collection}/{id}` returns
//! one document. Status codes are interpreted only in [`check_status`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde_json::Value;

use super::config::UpstreamConfig;
use super::error::{UpstreamError, UpstreamResult};
use super::source::ManifestSource;
use crate::routes::manifests::{ManifestListQuery, ManifestPage};

const USER_AGENT_VALUE: &str = concat!("manifest-viewer/", env!("CARGO_PKG_VERSION"));

/// [`ManifestSource`] backed by the external manifest API.
#[derive(Debug, Clone)]
pub struct HttpManifestSource {
    client: reqwest::Client,
    base_url: String,
    collection: String,
}

impl HttpManifestSource {
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let base_url = config
            .api_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| UpstreamError::config("MANIFEST_API_URL is required for the http source"))?;
        Url::parse(&base_url)
            .map_err(|e| UpstreamError::config(format!("invalid MANIFEST_API_URL: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(auth) = config.authorization_header() {
            let mut value = HeaderValue::from_str(&auth)
                .map_err(|_| UpstreamError::config("MANIFEST_API_KEY contains invalid characters"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            log::warn!("No MANIFEST_API_KEY configured; calling the manifest API anonymously");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| UpstreamError::network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            collection: config.collection.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> UpstreamResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| UpstreamError::config(format!("invalid MANIFEST_API_URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::config("MANIFEST_API_URL cannot be a base URL"))?
            .pop_if_empty()
            .extend(["api", self.collection.as_str()]);
        Ok(url)
    }

    /// URL of one document. The id is a single percent-encoded path segment.
    fn document_url(&self, id: &str) -> UpstreamResult<Url> {
        if id == "." || id == ".." {
            return Err(UpstreamError::bad_request(format!("invalid manifestId '{}'", id)));
        }
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::config("MANIFEST_API_URL cannot be a base URL"))?
            .push(id);
        Ok(url)
    }

    async fn get_json(&self, url: Url, params: &[(String, String)]) -> UpstreamResult<Value> {
        log::debug!("GET {} {:?}", url, params);
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| UpstreamError::network(e.to_string()))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| UpstreamError::invalid_response(format!("failed to parse body: {}", e)))
    }
}

/// Payload query parameters for a list request.
pub fn list_params(query: &ManifestListQuery) -> Vec<(String, String)> {
    let mut params = vec![
        ("page".to_string(), query.page.to_string()),
        ("limit".to_string(), query.page_size.to_string()),
        ("sort".to_string(), query.sort_param()),
    ];

    let mut clause = |field: &str, operator: &str, value: &Option<String>| {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            params.push((
                format!("where[manifestInfo.{}][{}]", field, operator),
                value.to_string(),
            ));
        }
    };

    clause("manifestNo", "like", &query.manifest_no);
    clause("flightNo", "like", &query.flight_no);
    clause("pointOfLoading", "equals", &query.point_of_loading);
    clause("pointOfUnloading", "equals", &query.point_of_unloading);
    clause("ownerOrOperator", "equals", &query.owner_or_operator);
    clause("registration", "equals", &query.registration);
    clause("flightDate", "greater_than_equal", &query.date_from);
    clause("flightDate", "less_than_equal", &query.date_to);
    params
}

/// Turn a non-success response into [`UpstreamError::Status`].
async fn check_status(response: reqwest::Response) -> UpstreamResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text).ok().or_else(|| {
        (!text.trim().is_empty()).then(|| Value::String(text.clone()))
    });
    let reason = status.canonical_reason().unwrap_or("Upstream error");
    log::warn!("Manifest API returned {}: {}", status.as_u16(), text);
    Err(UpstreamError::from_status_body(status.as_u16(), body, reason))
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    async fn list_manifests(&self, query: &ManifestListQuery) -> UpstreamResult<ManifestPage> {
        let body = self.get_json(self.collection_url()?, &list_params(query)).await?;
        serde_json::from_value(body)
            .map_err(|e| UpstreamError::invalid_response(format!("unexpected list shape: {}", e)))
    }

    async fn fetch_manifest(&self, id: &str) -> UpstreamResult<Value> {
        let id = id.trim();
        if id.is_empty() {
            return Err(UpstreamError::bad_request("manifestId is required"));
        }
        self.get_json(self.document_url(id)?, &[]).await
    }

    async fn health_check(&self) -> UpstreamResult<bool> {
        let response = self
            .client
            .get(self.collection_url()?)
            .query(&[("limit", "1")])
            .send()
            .await;
        Ok(match response {
            Ok(r) => r.status().is_success() || r.status() == StatusCode::UNAUTHORIZED,
            Err(e) => {
                log::warn!("Manifest API health check failed: {}", e);
                false
            }
        })
    }

    fn kind(&self) -> &'static str {
        "http"
    }
}
