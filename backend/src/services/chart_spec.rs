//! Chart specifications authored by the chat assistant.
//!
//! A specification is untrusted input. Closed sets (source, chart type,
//! aggregate, sort, filter operator) are enforced by deserialization; field
//! names are normalized, defaulted and then checked against the fields the
//! source actually has.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::fields::{normalize_field, DataSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    StackedBar,
    Scatter,
    Histogram,
    Heatmap,
    Treemap,
}

impl ChartType {
    /// Chart types built from grouped `{name, value}` pairs rather than rows.
    pub fn uses_series(&self) -> bool {
        matches!(self, ChartType::Bar | ChartType::Line | ChartType::Pie)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    #[default]
    Sum,
    Count,
    Avg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Contains,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One `{field, op, value}` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    #[serde(default)]
    pub value: Value,
}

/// Chart specification as emitted by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(default)]
    pub source: DataSource,
    pub chart_type: ChartType,
    #[serde(default)]
    pub x_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_category_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<bool>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ChartSpecError {
    #[error("invalid chart specification: {0}")]
    Malformed(String),

    #[error("unknown field '{field}' for source '{source_name}'")]
    UnknownField { field: String, source_name: String },

    #[error("topN must be at least 1")]
    InvalidTopN,
}

fn normalize_opt(field: &Option<String>, source: DataSource, default: &str) -> String {
    match field.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => normalize_field(name, source),
        _ => default.to_string(),
    }
}

impl ChartSpec {
    /// A minimal specification, mostly useful in tests.
    pub fn new(source: DataSource, chart_type: ChartType, x_field: impl Into<String>) -> Self {
        Self {
            source,
            chart_type,
            x_field: x_field.into(),
            y_field: None,
            y_category_field: None,
            value_field: None,
            series_field: None,
            size_field: None,
            parent_field: None,
            child_field: None,
            aggregate: None,
            title: None,
            filters: Vec::new(),
            top_n: None,
            sort: None,
            unit: None,
            bin_count: None,
            stack: None,
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, ChartSpecError> {
        serde_json::from_value(value.clone()).map_err(|e| ChartSpecError::Malformed(e.to_string()))
    }

    /// Resolve aliases and fill every field the chart type needs.
    ///
    /// Treemaps always read house shipments.
    pub fn normalized(&self) -> ChartSpec {
        let mut spec = self.clone();
        if spec.chart_type == ChartType::Treemap {
            spec.source = DataSource::Hawbs;
        }
        let source = spec.source;

        let x_default = match spec.chart_type {
            ChartType::Scatter => "pieces",
            ChartType::Histogram => source.default_value_field(),
            _ => source.default_category_field(),
        };
        spec.x_field = normalize_opt(&Some(spec.x_field.clone()), source, x_default);

        let value_default = source.default_value_field();
        let value_field = normalize_opt(&spec.value_field, source, value_default);
        let y_field = normalize_opt(&spec.y_field, source, &value_field);
        spec.value_field = Some(value_field);
        spec.y_field = Some(y_field);

        spec.filters = spec
            .filters
            .into_iter()
            .map(|f| Filter {
                field: normalize_field(&f.field, source),
                ..f
            })
            .collect();

        spec.aggregate = Some(spec.aggregate.unwrap_or_default());

        match spec.chart_type {
            ChartType::Heatmap => {
                spec.y_category_field = Some(normalize_opt(
                    &spec.y_category_field,
                    source,
                    source.default_secondary_field(),
                ));
            }
            ChartType::StackedBar => {
                spec.series_field = Some(normalize_opt(
                    &spec.series_field,
                    source,
                    source.default_secondary_field(),
                ));
            }
            ChartType::Scatter => {
                if let Some(size) = spec.size_field.as_deref().filter(|s| !s.trim().is_empty()) {
                    spec.size_field = Some(normalize_field(size, source));
                } else {
                    spec.size_field = None;
                }
            }
            ChartType::Treemap => {
                spec.parent_field = Some(normalize_opt(&spec.parent_field, source, "awb_number"));
                spec.child_field = Some(normalize_opt(&spec.child_field, source, "hawb_number"));
            }
            _ => {}
        }
        spec
    }

    /// Check a normalized specification against the fields of its source.
    pub fn validate(&self) -> Result<(), ChartSpecError> {
        if self.top_n == Some(0) {
            return Err(ChartSpecError::InvalidTopN);
        }

        let fields = [
            Some(&self.x_field),
            self.y_field.as_ref(),
            self.value_field.as_ref(),
            self.y_category_field.as_ref(),
            self.series_field.as_ref(),
            self.size_field.as_ref(),
            self.parent_field.as_ref(),
            self.child_field.as_ref(),
        ];
        let filter_fields = self.filters.iter().map(|f| &f.field);

        for field in fields.into_iter().flatten().chain(filter_fields) {
            if !self.source.knows_field(field) {
                return Err(ChartSpecError::UnknownField {
                    field: field.clone(),
                    source_name: self.source.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn value_field(&self) -> &str {
        self.value_field
            .as_deref()
            .unwrap_or_else(|| self.source.default_value_field())
    }

    pub fn aggregate(&self) -> Aggregate {
        self.aggregate.unwrap_or_default()
    }

    /// Chart specifications embedded in an assistant reply.
    ///
    /// Fenced blocks tagged `chart` or `json` are tried; blocks that do not
    /// parse as a specification are skipped.
    pub fn extract_from_reply(reply: &str) -> Vec<ChartSpec> {
        fenced_blocks(reply)
            .into_iter()
            .filter_map(|(tag, body)| chart_block(tag, body))
            .collect()
    }
}

/// The specification held by a fenced block, if it is a chart block.
fn chart_block(tag: &str, body: &str) -> Option<ChartSpec> {
    if !matches!(tag, "chart" | "json") {
        return None;
    }
    let value: Value = serde_json::from_str(body.trim()).ok()?;
    match ChartSpec::from_json(&value) {
        Ok(spec) => Some(spec),
        Err(e) => {
            log::debug!("Ignoring fenced block that is not a chart: {}", e);
            None
        }
    }
}

/// Split markdown text into `(info tag, body)` pairs of fenced code blocks.
pub(crate) fn fenced_blocks(text: &str) -> Vec<(&str, &str)> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        let Some(line_end) = after_open.find('\n') else {
            break;
        };
        let tag = after_open[..line_end].trim();
        let body_start = &after_open[line_end + 1..];
        let Some(close) = body_start.find("```") else {
            break;
        };
        blocks.push((tag, body_start[..close].trim()));
        rest = &body_start[close + 3..];
    }
    blocks
}

/// Remove the fenced blocks [`ChartSpec::extract_from_reply`] would render,
/// leaving the prose and every other block.
pub(crate) fn strip_chart_blocks(reply: &str) -> String {
    let mut out = String::new();
    let mut rest = reply;
    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        let tag_end = after_open.find('\n').unwrap_or(after_open.len());
        let tag = after_open[..tag_end].trim();
        let Some(close) = after_open[tag_end..].find("```") else {
            break;
        };
        let body = &after_open[tag_end..tag_end + close];
        let block_end = open + 3 + tag_end + close + 3;
        if chart_block(tag, body).is_some() {
            out.push_str(&rest[..open]);
        } else {
            out.push_str(&rest[..block_end]);
        }
        rest = &rest[block_end..];
    }
    out.push_str(rest);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_camel_case() {
        let spec = ChartSpec::from_json(&json!({
            "source": "hawbs",
            "chartType": "stacked_bar",
            "xField": "awb",
            "seriesField": "customer",
            "aggregate": "avg",
            "topN": 5,
            "filters": [{"field": "pieces", "op": "gte", "value": 2}]
        }))
        .unwrap();
        assert_eq!(spec.source, DataSource::Hawbs);
        assert_eq!(spec.chart_type, ChartType::StackedBar);
        assert_eq!(spec.aggregate, Some(Aggregate::Avg));
        assert_eq!(spec.top_n, Some(5));
        assert_eq!(spec.filters[0].op, FilterOp::Gte);
    }

    #[test]
    fn test_unknown_enum_values_are_rejected() {
        let err = ChartSpec::from_json(&json!({"chartType": "radar", "xField": "awb"})).unwrap_err();
        assert!(matches!(err, ChartSpecError::Malformed(_)));

        let err = ChartSpec::from_json(&json!({
            "chartType": "bar",
            "filters": [{"field": "pieces", "op": "like", "value": 1}]
        }))
        .unwrap_err();
        assert!(matches!(err, ChartSpecError::Malformed(_)));
    }

    #[test]
    fn test_normalized_fills_defaults() {
        let spec = ChartSpec::new(DataSource::Ulds, ChartType::Bar, "").normalized();
        assert_eq!(spec.x_field, "uld_id");
        assert_eq!(spec.value_field.as_deref(), Some("weight.value"));
        assert_eq!(spec.aggregate, Some(Aggregate::Sum));

        let heatmap = ChartSpec::new(DataSource::Hawbs, ChartType::Heatmap, "awb").normalized();
        assert_eq!(heatmap.x_field, "awb_number");
        assert_eq!(heatmap.y_category_field.as_deref(), Some("customer"));
        assert_eq!(heatmap.value_field.as_deref(), Some("actual_weight_kg"));
    }

    #[test]
    fn test_treemap_forces_hawbs() {
        let spec = ChartSpec::new(DataSource::Shipments, ChartType::Treemap, "").normalized();
        assert_eq!(spec.source, DataSource::Hawbs);
        assert_eq!(spec.parent_field.as_deref(), Some("awb_number"));
        assert_eq!(spec.child_field.as_deref(), Some("hawb_number"));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_fields() {
        let spec = ChartSpec::new(DataSource::Ulds, ChartType::Bar, "customer").normalized();
        assert_eq!(
            spec.validate(),
            Err(ChartSpecError::UnknownField {
                field: "customer".to_string(),
                source_name: "ulds".to_string(),
            })
        );

        let mut spec = ChartSpec::new(DataSource::Shipments, ChartType::Bar, "awb");
        spec.top_n = Some(0);
        assert_eq!(spec.normalized().validate(), Err(ChartSpecError::InvalidTopN));
    }

    #[test]
    fn test_extract_from_reply() {
        let reply = "Here is the breakdown:\n\n```chart\n{\"chartType\": \"pie\", \"xField\": \"awb\"}\n```\n\nAnd some code:\n```rust\nfn main() {}\n```\n```json\n{\"not\": \"a chart\"}\n```\n";
        let specs = ChartSpec::extract_from_reply(reply);
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].chart_type, ChartType::Pie);

        let prose = strip_chart_blocks(reply);
        assert!(prose.starts_with("Here is the breakdown:"));
        assert!(prose.contains("fn main()"));
        assert!(!prose.contains("chartType"));
        assert!(prose.contains("```json\n{\"not\": \"a chart\"}\n```"));
    }
}
