//! Field access and field-name normalization for chart rows.
//!
//! Rows are JSON objects flattened from the canonical manifest. Chart
//! specifications written by the assistant name fields loosely (`mawb`,
//! `weight`, `uld`), so every field goes through [`normalize_field`] before it
//! is resolved with [`get_field`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::raw::safe_number;

/// Which flattened row set a chart reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Shipments,
    Ulds,
    Hawbs,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Shipments => "shipments",
            DataSource::Ulds => "ulds",
            DataSource::Hawbs => "hawbs",
        }
    }

    /// Field that identifies one row of this source.
    pub fn default_category_field(&self) -> &'static str {
        match self {
            DataSource::Shipments => "awb_number",
            DataSource::Ulds => "uld_id",
            DataSource::Hawbs => "hawb_number",
        }
    }

    pub fn default_value_field(&self) -> &'static str {
        match self {
            DataSource::Shipments | DataSource::Ulds => "weight.value",
            DataSource::Hawbs => "actual_weight_kg",
        }
    }

    /// Second category axis for heatmaps and stacked bars.
    pub fn default_secondary_field(&self) -> &'static str {
        match self {
            DataSource::Shipments => "nature_of_goods",
            DataSource::Ulds => "awb_number",
            DataSource::Hawbs => "customer",
        }
    }

    pub fn known_fields(&self) -> &'static [&'static str] {
        match self {
            DataSource::Shipments => &[
                "awb_number",
                "pieces",
                "weight",
                "nature_of_goods",
                "special_handling_codes",
                "storage_instructions",
            ],
            DataSource::Ulds => &["uld_id", "pieces", "weight", "awb_number"],
            DataSource::Hawbs => &[
                "hawb_number",
                "customer",
                "origin",
                "destination",
                "pieces",
                "actual_weight_kg",
                "chargeable_weight_kg",
                "remarks",
                "awb_number",
            ],
        }
    }

    /// Whether `path` names a field of this source or a sub-field of one.
    pub fn knows_field(&self, path: &str) -> bool {
        let root = path.split('.').next().unwrap_or(path);
        self.known_fields().contains(&root)
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a dotted path in a record.
///
/// A `{value, unit}` object whose `value` is numeric resolves to that number.
pub fn get_field(record: &Value, path: &str) -> Option<Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }

    if let Value::Object(map) = current {
        if let Some(inner) = map.get("value") {
            if matches!(inner, Value::Number(_) | Value::String(_)) {
                if let Some(number) = safe_number(inner) {
                    return Some(Value::from(number));
                }
            }
        }
    }
    Some(current.clone())
}

/// Map a field alias to its canonical path for `source`.
///
/// Unknown names pass through unchanged.
pub fn normalize_field(field: &str, source: DataSource) -> String {
    let trimmed = field.trim();
    let key = trimmed.to_ascii_lowercase();
    let canonical = match key.as_str() {
        "awb" | "mawb" | "awb_no" | "awbnumber" | "mawb_number" | "mawbnumber" | "masterbill"
        | "masterbillnumber" => "awb_number",
        "uld" | "uldid" | "uld_number" | "container" | "container_id" | "containernumber"
        | "container_number" => "uld_id",
        "hawb" | "hawbnumber" | "hawb_no" | "house" | "housebill" | "housebillnumber" => {
            "hawb_number"
        }
        "pcs" | "piece_count" | "piececount" | "pieces" => "pieces",
        "goods" | "nature" | "commodity" | "natureofgoods" => "nature_of_goods",
        "shc" | "shcs" | "specialhandlingcodes" => "special_handling_codes",
        "weight" | "weight_kg" | "kg" => match source {
            DataSource::Hawbs => "actual_weight_kg",
            DataSource::Shipments | DataSource::Ulds => "weight.value",
        },
        "actual_weight" | "actualweight" | "actualweightkg" => "actual_weight_kg",
        "chargeable" | "chargeable_weight" | "chargeableweight" | "chargeableweightkg" => {
            "chargeable_weight_kg"
        }
        "storage" | "storageinstructions" => "storage_instructions",
        _ => return trimmed.to_string(),
    };
    canonical.to_string()
}

/// Unit label implied by a field name.
pub fn infer_unit(field: &str) -> Option<&'static str> {
    let lower = field.to_ascii_lowercase();
    if lower.contains("weight") || lower.ends_with("_kg") {
        Some("kg")
    } else if lower.contains("pieces") || lower.contains("pcs") {
        Some("pcs")
    } else {
        None
    }
}
