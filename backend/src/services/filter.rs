//! Row filtering for chart specifications.

use serde_json::Value;

use super::chart_spec::{Filter, FilterOp};
use super::fields::get_field;

/// Numeric coercion used by the ordering operators.
///
/// Strings parse when they hold a number (an empty string is 0), booleans
/// are 0/1 and null is 0. Missing values and everything else do not compare.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        _ => None,
    };
    number.filter(|n| !n.is_nan())
}

/// Strict equality: same JSON type and same value, numbers compared by value.
pub(crate) fn strict_eq(left: Option<&Value>, right: &Value) -> bool {
    match (left, right) {
        (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Some(a), b) => a == b,
        (None, _) => false,
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let resolved = get_field(row, &filter.field);
    let resolved = resolved.as_ref();

    match filter.op {
        FilterOp::Eq => strict_eq(resolved, &filter.value),
        FilterOp::Neq => !strict_eq(resolved, &filter.value),
        FilterOp::Contains => match resolved {
            Some(Value::String(text)) => {
                let needle = match &filter.value {
                    Value::String(s) => s.to_lowercase(),
                    other => other.to_string().to_lowercase(),
                };
                text.to_lowercase().contains(&needle)
            }
            _ => false,
        },
        FilterOp::In => match &filter.value {
            Value::Array(options) => options.iter().any(|option| strict_eq(resolved, option)),
            _ => false,
        },
        FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
            let (Some(left), Some(right)) =
                (coerce_number(resolved), coerce_number(Some(&filter.value)))
            else {
                return false;
            };
            match filter.op {
                FilterOp::Gt => left > right,
                FilterOp::Gte => left >= right,
                FilterOp::Lt => left < right,
                _ => left <= right,
            }
        }
    }
}

/// Keep the rows that pass every filter.
pub fn apply_filters(rows: Vec<Value>, filters: &[Filter]) -> Vec<Value> {
    if filters.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| filters.iter().all(|f| matches(row, f)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(field: &str, op: FilterOp, value: Value) -> Filter {
        Filter {
            field: field.to_string(),
            op,
            value,
        }
    }

    fn rows() -> Vec<Value> {
        vec![
            json!({"awb_number": "176-1", "pieces": 0, "customer": "Acme Corp", "weight": {"value": 10.0, "unit": "kg"}}),
            json!({"awb_number": "176-2", "pieces": 3, "customer": "Globex", "weight": {"value": 25.5, "unit": "kg"}}),
            json!({"awb_number": "176-3", "pieces": "7", "customer": null, "weight": {"value": 40.0, "unit": "kg"}}),
        ]
    }

    fn awbs(rows: &[Value]) -> Vec<&str> {
        rows.iter().map(|r| r["awb_number"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_no_filters_returns_rows_unchanged() {
        assert_eq!(apply_filters(rows(), &[]), rows());
    }

    #[test]
    fn test_gt_zero_pieces() {
        let out = apply_filters(rows(), &[filter("pieces", FilterOp::Gt, json!(0))]);
        assert_eq!(awbs(&out), vec!["176-2", "176-3"]);
    }

    #[test]
    fn test_eq_is_strict() {
        let out = apply_filters(rows(), &[filter("pieces", FilterOp::Eq, json!(3))]);
        assert_eq!(awbs(&out), vec!["176-2"]);

        // "7" is a string, not the number 7.
        let out = apply_filters(rows(), &[filter("pieces", FilterOp::Eq, json!(7))]);
        assert!(out.is_empty());

        let out = apply_filters(rows(), &[filter("pieces", FilterOp::Eq, json!(3.0))]);
        assert_eq!(awbs(&out), vec!["176-2"]);
    }

    #[test]
    fn test_neq_keeps_missing_fields() {
        let out = apply_filters(rows(), &[filter("missing", FilterOp::Neq, json!("x"))]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_contains_is_case_insensitive_and_textual() {
        let out = apply_filters(rows(), &[filter("customer", FilterOp::Contains, json!("ACME"))]);
        assert_eq!(awbs(&out), vec!["176-1"]);

        // Numbers are not textual.
        let out = apply_filters(rows(), &[filter("pieces", FilterOp::Contains, json!("3"))]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_in_membership() {
        let out = apply_filters(
            rows(),
            &[filter("awb_number", FilterOp::In, json!(["176-1", "176-3"]))],
        );
        assert_eq!(awbs(&out), vec!["176-1", "176-3"]);

        let out = apply_filters(rows(), &[filter("awb_number", FilterOp::In, json!("176-1"))]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_numeric_comparisons_unwrap_weight() {
        let out = apply_filters(rows(), &[filter("weight", FilterOp::Gte, json!("25.5"))]);
        assert_eq!(awbs(&out), vec!["176-2", "176-3"]);

        let out = apply_filters(rows(), &[filter("weight.value", FilterOp::Lt, json!(25.5))]);
        assert_eq!(awbs(&out), vec!["176-1"]);

        let out = apply_filters(rows(), &[filter("pieces", FilterOp::Lte, json!(7))]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_filters_are_anded() {
        let out = apply_filters(
            rows(),
            &[
                filter("pieces", FilterOp::Gt, json!(0)),
                filter("weight", FilterOp::Lt, json!(30)),
            ],
        );
        assert_eq!(awbs(&out), vec!["176-2"]);
    }

    #[test]
    fn test_missing_field_never_compares() {
        let out = apply_filters(rows(), &[filter("nope", FilterOp::Gt, json!(-1))]);
        assert!(out.is_empty());
    }
}
