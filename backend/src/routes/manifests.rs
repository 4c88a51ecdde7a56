use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const GET_MANIFESTS: &str = "/api/get-manifests";
pub const GET_MANIFEST: &str = "/api/get-manifest";
pub const GET_TRANSFORMED_MANIFEST: &str = "/api/manifests/{id}";

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

/// List filters and paging, as sent by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestListQuery {
    pub manifest_no: Option<String>,
    pub flight_no: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub point_of_loading: Option<String>,
    pub point_of_unloading: Option<String>,
    pub owner_or_operator: Option<String>,
    pub registration: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub sort_by: String,
    pub sort_dir: SortDir,
}

impl Default for ManifestListQuery {
    fn default() -> Self {
        Self {
            manifest_no: None,
            flight_no: None,
            date_from: None,
            date_to: None,
            point_of_loading: None,
            point_of_unloading: None,
            owner_or_operator: None,
            registration: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: DEFAULT_SORT_FIELD.to_string(),
            sort_dir: SortDir::Desc,
        }
    }
}

impl ManifestListQuery {
    /// Clamp paging into range and drop blank filters.
    pub fn sanitized(mut self) -> Self {
        fn blank_to_none(value: &mut Option<String>) {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }

        self.page = self.page.max(1);
        self.page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        if self.sort_by.trim().is_empty() {
            self.sort_by = DEFAULT_SORT_FIELD.to_string();
        }
        for filter in [
            &mut self.manifest_no,
            &mut self.flight_no,
            &mut self.date_from,
            &mut self.date_to,
            &mut self.point_of_loading,
            &mut self.point_of_unloading,
            &mut self.owner_or_operator,
            &mut self.registration,
        ] {
            blank_to_none(filter);
        }
        self
    }

    /// Payload-style sort parameter: `createdAt` or `-createdAt`.
    pub fn sort_param(&self) -> String {
        match self.sort_dir {
            SortDir::Asc => self.sort_by.clone(),
            SortDir::Desc => format!("-{}", self.sort_by),
        }
    }
}

/// One page of raw manifest documents.
///
/// Keys this type does not name are kept in `extra` and passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPage {
    #[serde(default)]
    pub docs: Vec<Value>,
    #[serde(default)]
    pub total_docs: u64,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub has_prev_page: bool,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub prev_page: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestPage {
    /// Slice `docs` into the requested page.
    pub fn paginate(docs: Vec<Value>, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let total_docs = docs.len() as u64;
        let total_pages = (total_docs.div_ceil(limit as u64) as u32).max(1);
        let page = page.max(1);
        let start = ((page - 1) as usize).saturating_mul(limit as usize);

        let docs: Vec<Value> = docs.into_iter().skip(start).take(limit as usize).collect();
        let has_next_page = page < total_pages;
        let has_prev_page = page > 1;

        Self {
            docs,
            total_docs,
            limit,
            page,
            total_pages,
            has_next_page,
            has_prev_page,
            next_page: has_next_page.then_some(page + 1),
            prev_page: has_prev_page.then_some(page - 1),
            extra: Map::new(),
        }
    }
}
