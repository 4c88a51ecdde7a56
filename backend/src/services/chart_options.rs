//! Renderer option objects for each chart type.
//!
//! Options follow the ECharts option schema. Every builder returns `None`
//! when there is nothing to draw so the caller can show a placeholder.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::chart_data::{
    aggregate_rows, category_key, format_number, group_rows, number_at, numeric_value,
    SeriesPoint, UNKNOWN_CATEGORY,
};
use super::chart_spec::{Aggregate, ChartSpec, ChartType};
use super::fields::{get_field, infer_unit};
use crate::models::sum_kg;

pub const DEFAULT_BIN_COUNT: usize = 12;
pub const MIN_BIN_COUNT: usize = 5;
pub const MAX_BIN_COUNT: usize = 50;

/// Symbol size of scatter points without a size field.
pub const DEFAULT_SYMBOL_SIZE: f64 = 10.0;
const MIN_SYMBOL_SIZE: f64 = 6.0;
const MAX_SYMBOL_SIZE: f64 = 40.0;

/// One equal-width histogram bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Number of histogram buckets for a requested bin count.
pub fn resolve_bin_count(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_BIN_COUNT)
        .min(MAX_BIN_COUNT)
        .max(MIN_BIN_COUNT)
}

/// Bin `values` into `bucket_count` equal-width buckets.
///
/// The range always spans `[min(0, data_min), max(1, data_max)]`. Buckets
/// are closed on the right: a value on an inner boundary ends the lower
/// bucket, and the range minimum falls into the first one.
pub fn histogram_bins(values: &[f64], bucket_count: usize) -> Vec<HistogramBucket> {
    let bucket_count = bucket_count.max(1);
    let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lo = data_min.min(0.0);
    let hi = data_max.max(1.0);
    let width = (hi - lo) / bucket_count as f64;

    let mut buckets: Vec<HistogramBucket> = (0..bucket_count)
        .map(|i| HistogramBucket {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for value in values {
        let position = ((value - lo) / width).ceil();
        let idx = if position <= 1.0 {
            0
        } else {
            (position as usize - 1).min(bucket_count - 1)
        };
        buckets[idx].count += 1;
    }
    buckets
}

/// Unit shown on the value axis of `field`.
///
/// An explicit unit wins. Counts carry no inferred unit.
pub fn axis_unit(spec: &ChartSpec, field: &str) -> Option<String> {
    if let Some(unit) = spec.unit.as_deref().filter(|u| !u.trim().is_empty()) {
        return Some(unit.trim().to_string());
    }
    if spec.aggregate() == Aggregate::Count && spec.chart_type != ChartType::Histogram {
        return None;
    }
    infer_unit(field).map(str::to_string)
}

fn value_formatter(unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{{value}} {}", unit),
        None => "{value}".to_string(),
    }
}

fn value_axis(unit: Option<&str>) -> Value {
    json!({
        "type": "value",
        "axisLabel": { "formatter": value_formatter(unit) }
    })
}

fn label(key: String) -> String {
    if key.is_empty() {
        UNKNOWN_CATEGORY.to_string()
    } else {
        key
    }
}

/// Title shown above the chart.
pub fn chart_title(spec: &ChartSpec) -> String {
    if let Some(title) = spec.title.as_deref().filter(|t| !t.trim().is_empty()) {
        return title.trim().to_string();
    }
    match spec.chart_type {
        ChartType::Histogram => format!("Distribution of {}", spec.x_field),
        ChartType::Scatter => format!(
            "{} vs {}",
            spec.y_field.as_deref().unwrap_or_else(|| spec.value_field()),
            spec.x_field
        ),
        ChartType::Treemap => format!(
            "{} by {}",
            spec.value_field(),
            spec.parent_field.as_deref().unwrap_or("awb_number")
        ),
        _ => {
            let aggregate = match spec.aggregate() {
                Aggregate::Sum => "Total",
                Aggregate::Count => "Count",
                Aggregate::Avg => "Average",
            };
            if spec.aggregate() == Aggregate::Count {
                format!("{} by {}", aggregate, spec.x_field)
            } else {
                format!("{} {} by {}", aggregate, spec.value_field(), spec.x_field)
            }
        }
    }
}

/// Bar, line and pie charts over shaped `{name, value}` pairs.
pub fn series_option(spec: &ChartSpec, points: &[SeriesPoint]) -> Option<Value> {
    if points.is_empty() {
        return None;
    }
    let unit = axis_unit(spec, spec.value_field());
    let title = chart_title(spec);

    let option = match spec.chart_type {
        ChartType::Pie => {
            let tooltip = match unit.as_deref() {
                Some(u) => format!("{{b}}: {{c}} {} ({{d}}%)", u),
                None => "{b}: {c} ({d}%)".to_string(),
            };
            json!({
                "title": { "text": title },
                "tooltip": { "trigger": "item", "formatter": tooltip },
                "legend": { "type": "scroll", "orient": "vertical", "left": "left" },
                "series": [{
                    "type": "pie",
                    "radius": "60%",
                    "data": points,
                }]
            })
        }
        _ => {
            let kind = if spec.chart_type == ChartType::Line { "line" } else { "bar" };
            let names: Vec<&str> = points.iter().map(|p| p.name.as_str()).collect();
            let values: Vec<f64> = points.iter().map(|p| p.value).collect();
            json!({
                "title": { "text": title },
                "tooltip": { "trigger": "axis" },
                "xAxis": { "type": "category", "data": names, "axisLabel": { "rotate": 30 } },
                "yAxis": value_axis(unit.as_deref()),
                "series": [{ "type": kind, "name": spec.value_field(), "data": values }]
            })
        }
    };
    Some(option)
}

/// Bars grouped by the category field, stacked by the series field.
pub fn stacked_bar_option(spec: &ChartSpec, rows: &[Value]) -> Option<Value> {
    let series_field = spec
        .series_field
        .as_deref()
        .unwrap_or_else(|| spec.source.default_secondary_field());
    let mut categories = group_rows(rows, &spec.x_field);
    if let Some(n) = spec.top_n {
        categories.truncate(n);
    }
    if categories.is_empty() {
        return None;
    }

    let mut series_keys: Vec<String> = Vec::new();
    for (_, members) in &categories {
        for row in members {
            let key = category_key(get_field(row, series_field).as_ref());
            if !series_keys.contains(&key) {
                series_keys.push(key);
            }
        }
    }

    let aggregate = spec.aggregate();
    let stack = spec.stack.unwrap_or(true);
    let series: Vec<Value> = series_keys
        .iter()
        .map(|series_key| {
            let data: Vec<f64> = categories
                .iter()
                .map(|(_, members)| {
                    let matching: Vec<&Value> = members
                        .iter()
                        .copied()
                        .filter(|row| {
                            category_key(get_field(row, series_field).as_ref()) == *series_key
                        })
                        .collect();
                    aggregate_rows(&matching, spec.value_field(), aggregate)
                })
                .collect();
            let mut entry = json!({
                "type": "bar",
                "name": label(series_key.clone()),
                "data": data,
            });
            if stack {
                entry["stack"] = json!("total");
            }
            entry
        })
        .collect();

    let names: Vec<String> = categories.into_iter().map(|(key, _)| label(key)).collect();
    let unit = axis_unit(spec, spec.value_field());
    Some(json!({
        "title": { "text": chart_title(spec) },
        "tooltip": { "trigger": "axis", "axisPointer": { "type": "shadow" } },
        "legend": { "type": "scroll" },
        "xAxis": { "type": "category", "data": names },
        "yAxis": value_axis(unit.as_deref()),
        "series": series
    }))
}

/// One point per row: `(x, y, size)`.
pub fn scatter_option(spec: &ChartSpec, rows: &[Value]) -> Option<Value> {
    if rows.is_empty() {
        return None;
    }
    let y_field = spec.y_field.as_deref().unwrap_or_else(|| spec.value_field());
    let size_field = spec.size_field.as_deref();
    let id_field = spec.source.default_category_field();

    let points: Vec<(String, f64, f64, f64)> = rows
        .iter()
        .map(|row| {
            let x = number_at(row, &spec.x_field).unwrap_or(0.0);
            let y = number_at(row, y_field).unwrap_or(0.0);
            let size = size_field
                .and_then(|f| number_at(row, f))
                .unwrap_or(DEFAULT_SYMBOL_SIZE);
            (label(category_key(get_field(row, id_field).as_ref())), x, y, size)
        })
        .collect();

    let max_size = points.iter().map(|p| p.3).fold(0.0_f64, f64::max);
    let data: Vec<Value> = points
        .into_iter()
        .map(|(name, x, y, size)| {
            let symbol_size = if size_field.is_some() && max_size > 0.0 {
                MIN_SYMBOL_SIZE + (MAX_SYMBOL_SIZE - MIN_SYMBOL_SIZE) * (size.max(0.0) / max_size)
            } else {
                DEFAULT_SYMBOL_SIZE
            };
            json!({ "name": name, "value": [x, y, size], "symbolSize": symbol_size })
        })
        .collect();

    let x_unit = spec.unit.clone().or_else(|| infer_unit(&spec.x_field).map(str::to_string));
    let y_unit = spec.unit.clone().or_else(|| infer_unit(y_field).map(str::to_string));
    Some(json!({
        "title": { "text": chart_title(spec) },
        "tooltip": { "trigger": "item" },
        "xAxis": { "type": "value", "name": spec.x_field, "axisLabel": { "formatter": value_formatter(x_unit.as_deref()) } },
        "yAxis": { "type": "value", "name": y_field, "axisLabel": { "formatter": value_formatter(y_unit.as_deref()) } },
        "series": [{ "type": "scatter", "data": data }]
    }))
}

/// Bucket counts of a numeric field.
pub fn histogram_option(spec: &ChartSpec, rows: &[Value]) -> Option<Value> {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|row| number_at(row, &spec.x_field))
        .collect();
    if values.is_empty() {
        return None;
    }
    let buckets = histogram_bins(&values, resolve_bin_count(spec.bin_count));
    let unit = axis_unit(spec, &spec.x_field);
    let suffix = unit.as_deref().map(|u| format!(" {}", u)).unwrap_or_default();
    let names: Vec<String> = buckets
        .iter()
        .map(|b| format!("{} - {}{}", format_bound(b.start), format_bound(b.end), suffix))
        .collect();
    let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();

    Some(json!({
        "title": { "text": chart_title(spec) },
        "tooltip": { "trigger": "axis" },
        "xAxis": { "type": "category", "data": names, "axisLabel": { "rotate": 30 } },
        "yAxis": { "type": "value", "name": "count", "minInterval": 1 },
        "series": [{ "type": "bar", "barCategoryGap": "2%", "data": counts }]
    }))
}

fn format_bound(value: f64) -> String {
    format_number((value * 100.0).round() / 100.0)
}

/// Dense grid of summed values over two category axes.
pub fn heatmap_option(spec: &ChartSpec, rows: &[Value]) -> Option<Value> {
    if rows.is_empty() {
        return None;
    }
    let y_field = spec
        .y_category_field
        .as_deref()
        .unwrap_or_else(|| spec.source.default_secondary_field());
    let value_field = spec.value_field();

    let x_groups = group_rows(rows, &spec.x_field);
    let y_keys: Vec<String> = group_rows(rows, y_field)
        .into_iter()
        .map(|(key, _)| key)
        .collect();

    let mut data: Vec<Value> = Vec::with_capacity(x_groups.len() * y_keys.len());
    let mut max_value = 0.0_f64;
    for (xi, (_, members)) in x_groups.iter().enumerate() {
        for (yi, y_key) in y_keys.iter().enumerate() {
            let cell = sum_kg(
                members
                    .iter()
                    .filter(|row| category_key(get_field(row, y_field).as_ref()) == *y_key)
                    .map(|row| numeric_value(row, value_field)),
            );
            max_value = max_value.max(cell);
            data.push(json!([xi, yi, cell]));
        }
    }

    let x_names: Vec<String> = x_groups.into_iter().map(|(key, _)| label(key)).collect();
    let y_names: Vec<String> = y_keys.into_iter().map(label).collect();
    Some(json!({
        "title": { "text": chart_title(spec) },
        "tooltip": { "position": "top" },
        "xAxis": { "type": "category", "data": x_names, "splitArea": { "show": true } },
        "yAxis": { "type": "category", "data": y_names, "splitArea": { "show": true } },
        "visualMap": {
            "min": 0,
            "max": max_value,
            "calculable": true,
            "orient": "horizontal",
            "left": "center",
            "bottom": 0
        },
        "series": [{ "type": "heatmap", "data": data, "label": { "show": true } }]
    }))
}

/// Parent → child hierarchy over house shipments.
pub fn treemap_option(spec: &ChartSpec, rows: &[Value]) -> Option<Value> {
    let parent_field = spec.parent_field.as_deref().unwrap_or("awb_number");
    let child_field = spec.child_field.as_deref().unwrap_or("hawb_number");
    let value_field = spec.value_field();

    let tree: Vec<Value> = group_rows(rows, parent_field)
        .into_iter()
        .filter_map(|(parent, members)| {
            let children: Vec<(String, f64)> = group_rows(
                &members.into_iter().cloned().collect::<Vec<Value>>(),
                child_field,
            )
            .into_iter()
            .map(|(child, leaves)| {
                let value = sum_kg(leaves.iter().map(|r| numeric_value(r, value_field)));
                (label(child), value)
            })
            .collect();
            let total = sum_kg(children.iter().map(|(_, v)| *v));
            if children.is_empty() || total == 0.0 {
                return None;
            }
            let children: Vec<Value> = children
                .into_iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect();
            Some(json!({ "name": label(parent), "value": total, "children": children }))
        })
        .collect();

    if tree.is_empty() {
        return None;
    }
    let unit = axis_unit(spec, value_field);
    let tooltip = match unit.as_deref() {
        Some(u) => format!("{{b}}: {{c}} {}", u),
        None => "{b}: {c}".to_string(),
    };
    Some(json!({
        "title": { "text": chart_title(spec) },
        "tooltip": { "formatter": tooltip },
        "series": [{
            "type": "treemap",
            "leafDepth": 1,
            "data": tree
        }]
    }))
}

#[cfg(test)]
#[path = "chart_options_tests.rs"]
mod chart_options_tests;
