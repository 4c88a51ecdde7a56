//! Chart data shaping.
//!
//! Flattens a manifest into rows for one [`DataSource`], groups rows by a
//! category field and aggregates a value field into `{name, value}` pairs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chart_spec::{Aggregate, ChartSpec, SortDirection};
use super::fields::{get_field, DataSource};
use super::filter::apply_filters;
use crate::models::raw::safe_number;
use crate::models::{sum_kg, ManifestData};

/// Points kept when a specification asks for neither sorting nor `topN`.
pub const DEFAULT_POINT_CAP: usize = 20;

/// Label used for rows whose category cannot be resolved.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// One `{name, value}` pair of a shaped series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub name: String,
    pub value: f64,
}

/// Flatten a manifest into the rows of `source`.
///
/// ULD and house rows carry the AWB number of their shipment.
pub fn build_rows(manifest: &ManifestData, source: DataSource) -> Vec<Value> {
    fn with_awb<T: Serialize>(item: &T, awb_number: &str) -> Option<Value> {
        let mut row = serde_json::to_value(item).ok()?;
        row.as_object_mut()?
            .insert("awb_number".to_string(), Value::from(awb_number));
        Some(row)
    }

    match source {
        DataSource::Shipments => manifest
            .shipments
            .iter()
            .filter_map(|s| serde_json::to_value(s).ok())
            .collect(),
        DataSource::Ulds => manifest
            .shipments
            .iter()
            .flat_map(|s| s.uld_contents.iter().map(move |u| (s, u)))
            .filter_map(|(s, u)| with_awb(u, &s.awb_number))
            .collect(),
        DataSource::Hawbs => manifest
            .shipments
            .iter()
            .flat_map(|s| s.house_shipments.iter().map(move |h| (s, h)))
            .filter_map(|(s, h)| with_awb(h, &s.awb_number))
            .collect(),
    }
}

/// Render a JSON value the way a category label is displayed.
///
/// Missing and null values become the empty string.
pub fn category_key(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => format_number(n.as_f64().unwrap_or(0.0)),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| category_key(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(other) => other.to_string(),
    }
}

/// Integral values print without a fractional part.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

pub(crate) fn number_at(row: &Value, path: &str) -> Option<f64> {
    get_field(row, path).as_ref().and_then(safe_number)
}

/// Numeric value of `field` in `row`.
///
/// Falls back to `<field>.value` for weight-named fields, then to the row's
/// `weight.value`, then `weight_kg`, then 0.
pub fn numeric_value(row: &Value, field: &str) -> f64 {
    number_at(row, field)
        .or_else(|| {
            field
                .ends_with("weight")
                .then(|| number_at(row, &format!("{}.value", field)))
                .flatten()
        })
        .or_else(|| number_at(row, "weight.value"))
        .or_else(|| number_at(row, "weight_kg"))
        .unwrap_or(0.0)
}

/// Group rows by the displayed value of `field`, in first-seen order.
pub fn group_rows<'a>(rows: &'a [Value], field: &str) -> Vec<(String, Vec<&'a Value>)> {
    let mut groups: Vec<(String, Vec<&'a Value>)> = Vec::new();
    for row in rows {
        let key = category_key(get_field(row, field).as_ref());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(row),
            None => groups.push((key, vec![row])),
        }
    }
    groups
}

pub fn aggregate_rows(rows: &[&Value], value_field: &str, aggregate: Aggregate) -> f64 {
    match aggregate {
        Aggregate::Count => rows.len() as f64,
        Aggregate::Sum => sum_kg(rows.iter().map(|r| numeric_value(r, value_field))),
        Aggregate::Avg => {
            if rows.is_empty() {
                0.0
            } else {
                let sum = sum_kg(rows.iter().map(|r| numeric_value(r, value_field)));
                sum / rows.len() as f64
            }
        }
    }
}

fn aggregate_groups(rows: &[Value], category: &str, value_field: &str, aggregate: Aggregate) -> Vec<(String, f64)> {
    group_rows(rows, category)
        .into_iter()
        .map(|(key, members)| (key, aggregate_rows(&members, value_field, aggregate)))
        .collect()
}

/// Produce the `{name, value}` series of a normalized specification.
///
/// When more than half of the groups have no category, the grouping is
/// retried once with the source's identifying field.
pub fn shape_series(spec: &ChartSpec, rows: Vec<Value>) -> Vec<SeriesPoint> {
    let rows = apply_filters(rows, &spec.filters);
    let value_field = spec.value_field();
    let aggregate = spec.aggregate();

    let mut groups = aggregate_groups(&rows, &spec.x_field, value_field, aggregate);

    let unknown = groups.iter().filter(|(key, _)| key.is_empty()).count();
    let fallback = spec.source.default_category_field();
    if unknown * 2 > groups.len() && spec.x_field != fallback {
        log::warn!(
            "Category field '{}' unresolved for {} rows, regrouping by '{}'",
            spec.x_field,
            spec.source,
            fallback
        );
        groups = aggregate_groups(&rows, fallback, value_field, aggregate);
    }

    let mut points: Vec<SeriesPoint> = groups
        .into_iter()
        .map(|(key, value)| SeriesPoint {
            name: if key.is_empty() {
                UNKNOWN_CATEGORY.to_string()
            } else {
                key
            },
            value,
        })
        .collect();

    if let Some(direction) = spec.sort {
        points.sort_by(|a, b| {
            let ordering = a
                .value
                .partial_cmp(&b.value)
                .unwrap_or(std::cmp::Ordering::Equal);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    match (spec.sort, spec.top_n) {
        (_, Some(n)) => points.truncate(n),
        (None, None) => points.truncate(DEFAULT_POINT_CAP),
        (Some(_), None) => {}
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chart_spec::{ChartType, Filter, FilterOp};
    use serde_json::json;

    fn spec(x_field: &str, value_field: &str, aggregate: Aggregate) -> ChartSpec {
        let mut spec = ChartSpec::new(DataSource::Shipments, ChartType::Bar, x_field);
        spec.value_field = Some(value_field.to_string());
        spec.aggregate = Some(aggregate);
        spec
    }

    fn awb_rows() -> Vec<Value> {
        vec![
            json!({"awb": "A", "w": 10}),
            json!({"awb": "A", "w": 5}),
            json!({"awb": "B", "w": 3}),
        ]
    }

    #[test]
    fn test_sum_by_category_keeps_insertion_order() {
        let points = shape_series(&spec("awb", "w", Aggregate::Sum), awb_rows());
        assert_eq!(
            points,
            vec![
                SeriesPoint { name: "A".to_string(), value: 15.0 },
                SeriesPoint { name: "B".to_string(), value: 3.0 },
            ]
        );
    }

    #[test]
    fn test_count_and_avg() {
        let counts = shape_series(&spec("awb", "w", Aggregate::Count), awb_rows());
        assert_eq!(counts[0].value, 2.0);
        assert_eq!(counts[1].value, 1.0);

        let avgs = shape_series(&spec("awb", "w", Aggregate::Avg), awb_rows());
        assert_eq!(avgs[0].value, 7.5);
        assert_eq!(avgs[1].value, 3.0);
    }

    #[test]
    fn test_sort_and_top_n() {
        let mut s = spec("awb", "w", Aggregate::Sum);
        s.sort = Some(SortDirection::Asc);
        let points = shape_series(&s, awb_rows());
        assert_eq!(points[0].name, "B");

        s.sort = Some(SortDirection::Desc);
        s.top_n = Some(1);
        let points = shape_series(&s, awb_rows());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name, "A");
    }

    #[test]
    fn test_default_cap() {
        let rows: Vec<Value> = (0..30).map(|i| json!({"awb": format!("A{}", i), "w": i})).collect();
        let points = shape_series(&spec("awb", "w", Aggregate::Sum), rows.clone());
        assert_eq!(points.len(), DEFAULT_POINT_CAP);

        let mut sorted = spec("awb", "w", Aggregate::Sum);
        sorted.sort = Some(SortDirection::Desc);
        assert_eq!(shape_series(&sorted, rows).len(), 30);
    }

    #[test]
    fn test_unresolved_category_falls_back_to_awb() {
        let rows = vec![
            json!({"awb_number": "A", "weight": {"value": 2.0, "unit": "kg"}}),
            json!({"awb_number": "B", "weight": {"value": 3.0, "unit": "kg"}}),
        ];
        let points = shape_series(&spec("storage_instructions", "weight.value", Aggregate::Sum), rows);
        let names: Vec<&str> = points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_partial_unknown_category_is_labelled() {
        let rows = vec![
            json!({"awb_number": "A", "customer": "X", "w": 1}),
            json!({"awb_number": "B", "customer": "Y", "w": 1}),
            json!({"awb_number": "C", "w": 1}),
        ];
        let points = shape_series(&spec("customer", "w", Aggregate::Count), rows);
        let names: Vec<&str> = points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y", UNKNOWN_CATEGORY]);
    }

    #[test]
    fn test_filters_applied_before_grouping() {
        let mut s = spec("awb", "w", Aggregate::Sum);
        s.filters = vec![Filter {
            field: "w".to_string(),
            op: FilterOp::Gt,
            value: json!(4),
        }];
        let points = shape_series(&s, awb_rows());
        assert_eq!(points, vec![SeriesPoint { name: "A".to_string(), value: 15.0 }]);
    }

    #[test]
    fn test_numeric_value_fallback_chain() {
        let row = json!({"gross_weight": {"value": "4"}, "weight": {"value": 9}, "weight_kg": 11});
        assert_eq!(numeric_value(&row, "gross_weight"), 4.0);
        assert_eq!(numeric_value(&row, "missing"), 9.0);
        assert_eq!(numeric_value(&json!({"weight_kg": 11}), "missing"), 11.0);
        assert_eq!(numeric_value(&json!({}), "missing"), 0.0);
    }

    #[test]
    fn test_category_key_formatting() {
        assert_eq!(category_key(Some(&json!(12.0))), "12");
        assert_eq!(category_key(Some(&json!(2.5))), "2.5");
        assert_eq!(category_key(Some(&json!(["DGR", "ELI"]))), "DGR,ELI");
        assert_eq!(category_key(Some(&json!(null))), "");
        assert_eq!(category_key(None), "");
    }
}
