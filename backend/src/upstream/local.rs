//! In-memory manifest source for development and tests.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde_json::Value;

use super::error::{UpstreamError, UpstreamResult};
use super::source::ManifestSource;
use crate::routes::manifests::{ManifestListQuery, ManifestPage, SortDir};

/// [`ManifestSource`] holding raw documents in memory.
///
/// Filtering mirrors the external API: `manifestNo` and `flightNo` match as
/// case-insensitive substrings, the other filters by equality, and the date
/// range is inclusive on `manifestInfo.flightDate`.
#[derive(Debug, Clone, Default)]
pub struct LocalManifestSource {
    documents: Arc<RwLock<Vec<Value>>>,
}

fn document_id(doc: &Value) -> Option<String> {
    match doc.get("id").or_else(|| doc.get("_id"))? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn info_text(doc: &Value, key: &str) -> Option<String> {
    let info = doc.get("manifestInfo").or_else(|| doc.get("manifest_info"))?;
    match info.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Leading `YYYY-MM-DD` of a date or timestamp string.
fn date_of(text: &str) -> Option<NaiveDate> {
    let prefix = text.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn within_range(flight_date: Option<&str>, from: Option<&str>, to: Option<&str>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(flight_date) = flight_date else {
        return false;
    };

    let compare = |bound: &str| match (date_of(flight_date), date_of(bound)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => flight_date.cmp(bound),
    };
    from.map_or(true, |f| compare(f) != Ordering::Less)
        && to.map_or(true, |t| compare(t) != Ordering::Greater)
}

fn matches(doc: &Value, query: &ManifestListQuery) -> bool {
    let contains = |key: &str, needle: &Option<String>| match needle {
        None => true,
        Some(needle) => info_text(doc, key)
            .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
    };
    let equals = |key: &str, expected: &Option<String>| match expected {
        None => true,
        Some(expected) => info_text(doc, key).is_some_and(|v| v.eq_ignore_ascii_case(expected)),
    };

    contains("manifestNo", &query.manifest_no)
        && contains("flightNo", &query.flight_no)
        && equals("pointOfLoading", &query.point_of_loading)
        && equals("pointOfUnloading", &query.point_of_unloading)
        && equals("ownerOrOperator", &query.owner_or_operator)
        && equals("registration", &query.registration)
        && within_range(
            info_text(doc, "flightDate").as_deref(),
            query.date_from.as_deref(),
            query.date_to.as_deref(),
        )
}

/// Sort key: a top-level field, else the same key under `manifestInfo`.
fn sort_value<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    doc.get(field).or_else(|| {
        doc.get("manifestInfo")
            .and_then(|info| info.get(field.trim_start_matches("manifestInfo.")))
    })
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

impl LocalManifestSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Value>) -> Self {
        Self {
            documents: Arc::new(RwLock::new(documents)),
        }
    }

    /// Load a JSON array of raw documents.
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> UpstreamResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            UpstreamError::config(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;
        let documents = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(docs)) => docs,
            Ok(Value::Object(page)) => match page.get("docs") {
                Some(Value::Array(docs)) => docs.clone(),
                _ => vec![Value::Object(page)],
            },
            Ok(_) => {
                return Err(UpstreamError::config(
                    "Seed file must hold an array of manifest documents",
                ))
            }
            Err(e) => {
                return Err(UpstreamError::config(format!(
                    "Failed to parse seed file {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        log::info!("Loaded {} manifests from {}", documents.len(), path.display());
        Ok(Self::with_documents(documents))
    }

    /// Add or replace a document, keyed by its `id`.
    pub fn insert(&self, document: Value) {
        let id = document_id(&document);
        let mut docs = self.documents.write();
        match id.and_then(|id| docs.iter().position(|d| document_id(d).as_deref() == Some(id.as_str()))) {
            Some(slot) => docs[slot] = document,
            None => docs.push(document),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl ManifestSource for LocalManifestSource {
    async fn list_manifests(&self, query: &ManifestListQuery) -> UpstreamResult<ManifestPage> {
        let mut docs: Vec<Value> = self
            .documents
            .read()
            .iter()
            .filter(|doc| matches(doc, query))
            .cloned()
            .collect();

        docs.sort_by(|a, b| {
            let ordering = compare_values(
                sort_value(a, &query.sort_by),
                sort_value(b, &query.sort_by),
            );
            match query.sort_dir {
                SortDir::Asc => ordering,
                SortDir::Desc => ordering.reverse(),
            }
        });

        Ok(ManifestPage::paginate(docs, query.page, query.page_size))
    }

    async fn fetch_manifest(&self, id: &str) -> UpstreamResult<Value> {
        let id = id.trim();
        if id.is_empty() {
            return Err(UpstreamError::bad_request("manifestId is required"));
        }
        self.documents
            .read()
            .iter()
            .find(|doc| document_id(doc).as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| UpstreamError::not_found(id))
    }

    async fn health_check(&self) -> UpstreamResult<bool> {
        Ok(true)
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}
