//! Upstream manifest document shapes.
//!
//! The external feed is unversioned and drifts: numbers arrive as strings,
//! arrays go missing, and the masterbill list of a container is not always
//! stored under the same key. Everything here deserializes leniently so the
//! aggregator only ever sees well-formed records. Anything that cannot be
//! read becomes an empty/zero value instead of an error.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::manifest::sum_kg;

/// ULD id used when a piece cannot be attributed to any container.
pub const UNKNOWN_ULD: &str = "UNKNOWN-ULD";

/// Keys under which a container may carry its masterbills, in priority order.
const MASTERBILL_KEYS: [&str; 2] = ["masterbills", "masterbill"];

/// Keys that identify an object as a masterbill when probing unknown arrays.
const MASTERBILL_MARKERS: [&str; 3] = ["masterbillNumber", "housebills", "pieces"];

/// Coerce a JSON scalar into a finite number.
///
/// Numbers and numeric strings are accepted, as is the `{value, unit}`
/// wrapper. Everything else is `None`.
pub fn safe_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Object(map) => map.get("value").and_then(safe_number),
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(safe_number(&value).unwrap_or_else(|| {
        if !value.is_null() {
            log::debug!("Non-numeric weight {} coerced to 0", value);
        }
        0.0
    }))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_of(&value))
}

/// Customers arrive either as a plain name or as a related record.
fn lenient_party<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let name = match &value {
        Value::Object(map) => ["name", "companyName", "customerName"]
            .iter()
            .find_map(|k| map.get(*k).and_then(text_of)),
        other => text_of(other),
    };
    Ok(name.unwrap_or_default())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(records_of(&value))
}

fn records_of<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// SHC lists hold either `{code}` records or bare codes.
fn lenient_codes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => map.get("code").and_then(text_of),
            other => text_of(other),
        })
        .collect())
}

/// The finest-grained weight-bearing unit of the feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPiece {
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub container_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHousebill {
    #[serde(default, deserialize_with = "lenient_text")]
    pub housebill_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_party")]
    pub customer: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub remarks: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub pieces: Vec<RawPiece>,
}

impl RawHousebill {
    pub fn total_weight(&self) -> f64 {
        sum_kg(self.pieces.iter().map(|p| p.weight))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMasterbill {
    #[serde(default, deserialize_with = "lenient_text")]
    pub masterbill_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub nature_of_goods: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub storage_instructions: Option<String>,
    #[serde(default, deserialize_with = "lenient_codes")]
    pub shcs: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub pieces: Vec<RawPiece>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub housebills: Vec<RawHousebill>,
}

impl RawMasterbill {
    /// Piece count: the masterbill's own pieces, else the pieces of its houses.
    pub fn piece_count(&self) -> u64 {
        if self.pieces.is_empty() {
            self.housebills.iter().map(|h| h.pieces.len() as u64).sum()
        } else {
            self.pieces.len() as u64
        }
    }

    /// Weight carried by the housebills' pieces.
    pub fn house_weight(&self) -> f64 {
        sum_kg(self.housebills.iter().map(RawHousebill::total_weight))
    }
}

/// Where a container keeps its masterbills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MasterbillSource<'a> {
    /// Stored under one of the known keys.
    Keyed(&'a [Value]),
    /// Found by probing the container for an array of masterbill-like objects.
    Probed { key: &'a str, items: &'a [Value] },
    Missing,
}

impl<'a> MasterbillSource<'a> {
    /// Locate the masterbill array of a container.
    ///
    /// The known keys win. Otherwise the first array, in document order,
    /// whose first element carries a masterbill marker key is used.
    pub fn locate(container: &'a Map<String, Value>) -> Self {
        if let Some(items) = MASTERBILL_KEYS
            .iter()
            .find_map(|key| container.get(*key).and_then(Value::as_array))
        {
            return MasterbillSource::Keyed(items);
        }

        container
            .iter()
            .find_map(|(key, value)| {
                let items = value.as_array()?;
                let first = items.first()?.as_object()?;
                MASTERBILL_MARKERS
                    .iter()
                    .any(|marker| first.contains_key(*marker))
                    .then_some(MasterbillSource::Probed {
                        key: key.as_str(),
                        items: items.as_slice(),
                    })
            })
            .unwrap_or(MasterbillSource::Missing)
    }

    pub fn records(&self) -> Vec<RawMasterbill> {
        match self {
            MasterbillSource::Keyed(items) | MasterbillSource::Probed { items, .. } => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            MasterbillSource::Missing => Vec::new(),
        }
    }
}

/// A container (ULD) of the feed together with its masterbills.
#[derive(Debug, Clone)]
pub struct RawContainer {
    pub container_number: Option<String>,
    pub masterbills: Vec<RawMasterbill>,
}

impl RawContainer {
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let source = MasterbillSource::locate(map);
        if let MasterbillSource::Probed { key, .. } = source {
            log::warn!("Masterbills located under unexpected key '{}'", key);
        }
        Some(Self {
            container_number: map.get("containerNumber").and_then(text_of),
            masterbills: source.records(),
        })
    }

    /// Id pieces fall back to when they do not name their own container.
    pub fn uld_id(&self) -> &str {
        self.container_number.as_deref().unwrap_or(UNKNOWN_ULD)
    }
}

/// Manifest header block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawManifestInfo {
    #[serde(default, alias = "manifestNumber", deserialize_with = "lenient_text")]
    pub manifest_no: Option<String>,
    #[serde(default, alias = "flightNumber", deserialize_with = "lenient_text")]
    pub flight_no: Option<String>,
    #[serde(default, alias = "departureAirport", deserialize_with = "lenient_text")]
    pub point_of_loading: Option<String>,
    #[serde(default, alias = "arrivalAirport", deserialize_with = "lenient_text")]
    pub point_of_unloading: Option<String>,
    #[serde(default, alias = "departureDate", deserialize_with = "lenient_text")]
    pub flight_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub arrival_date: Option<String>,
}

/// A raw manifest document as returned by the detail endpoint.
#[derive(Debug, Clone, Default)]
pub struct RawManifestDocument {
    pub id: String,
    pub info: RawManifestInfo,
    pub containers: Vec<RawContainer>,
    /// Top-level masterbills, consulted only when no container yields any.
    pub masterbills: Vec<RawMasterbill>,
}

impl RawManifestDocument {
    pub fn from_value(doc: &Value) -> Self {
        let id = ["id", "_id"]
            .iter()
            .find_map(|k| doc.get(*k).and_then(text_of))
            .unwrap_or_default();

        let info = ["manifestInfo", "manifest_info"]
            .iter()
            .find_map(|k| doc.get(*k))
            .map(|block| {
                serde_json::from_value(block.clone()).unwrap_or_else(|e| {
                    log::warn!("Unreadable manifest info block for {}: {}", id, e);
                    RawManifestInfo::default()
                })
            })
            .unwrap_or_default();

        let containers = doc
            .get("containers")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(RawContainer::from_value).collect())
            .unwrap_or_default();

        let masterbills = doc.get("masterbills").map(records_of).unwrap_or_default();

        Self {
            id,
            info,
            containers,
            masterbills,
        }
    }
}
