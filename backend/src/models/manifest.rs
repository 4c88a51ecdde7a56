//! Canonical manifest model.
//!
//! These are the shapes the dashboard and the chart pipeline work with. They are
//! produced fresh by [`crate::services::aggregator::transform_manifest`] for every
//! detail fetch and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Unit used for every weight the aggregator produces.
pub const WEIGHT_UNIT_KG: &str = "kg";

/// A `{value, unit}` weight as exposed by the upstream API and the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub value: f64,
    pub unit: String,
}

impl Weight {
    pub fn kg(value: f64) -> Self {
        Self {
            value,
            unit: WEIGHT_UNIT_KG.to_string(),
        }
    }
}

/// Sum of weights, starting from positive zero.
///
/// `Iterator::sum` over `f64` starts at `-0.0`, which serializes as `-0.0`.
pub fn sum_kg<I: IntoIterator<Item = f64>>(weights: I) -> f64 {
    weights.into_iter().fold(0.0, |acc, w| acc + w)
}

impl Default for Weight {
    fn default() -> Self {
        Self::kg(0.0)
    }
}

/// Flight route and schedule of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightDetails {
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_date: String,
    pub arrival_date: String,
}

/// Pieces and weight of one shipment loaded into one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UldContent {
    pub uld_id: String,
    pub pieces: u64,
    pub weight: Weight,
}

/// A house air waybill under a master shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseShipment {
    pub hawb_number: String,
    pub customer: String,
    pub origin: String,
    pub destination: String,
    pub pieces: u64,
    pub actual_weight_kg: f64,
    pub chargeable_weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// A master air waybill, keyed by `awb_number` within its manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub awb_number: String,
    pub pieces: u64,
    pub weight: Weight,
    pub nature_of_goods: String,
    pub special_handling_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_instructions: Option<String>,
    pub uld_contents: Vec<UldContent>,
    pub house_shipments: Vec<HouseShipment>,
}

/// One manifest with its shipments and recomputed totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestData {
    pub id: String,
    pub manifest_number: String,
    pub flight_details: FlightDetails,
    pub shipments: Vec<Shipment>,
    pub total_pieces: u64,
    pub total_weight: Weight,
}

impl ManifestData {
    /// Build a manifest whose totals are summed from `shipments`.
    pub fn new(
        id: String,
        manifest_number: String,
        flight_details: FlightDetails,
        shipments: Vec<Shipment>,
    ) -> Self {
        let total_pieces = shipments.iter().map(|s| s.pieces).sum();
        let total_weight = Weight::kg(sum_kg(shipments.iter().map(|s| s.weight.value)));
        Self {
            id,
            manifest_number,
            flight_details,
            shipments,
            total_pieces,
            total_weight,
        }
    }

    pub fn shipment(&self, awb_number: &str) -> Option<&Shipment> {
        self.shipments.iter().find(|s| s.awb_number == awb_number)
    }

    /// Resolve a detail-pane selection.
    pub fn select(&self, item: &ItemRef) -> Option<SelectedItem> {
        match item {
            ItemRef::Uld { awb_number, uld_id } => {
                let shipment = self.shipment(awb_number)?;
                let content = shipment.uld_contents.iter().find(|u| &u.uld_id == uld_id)?;
                Some(SelectedItem::Uld {
                    awb_number: awb_number.clone(),
                    content: content.clone(),
                })
            }
            ItemRef::Hawb {
                awb_number,
                hawb_number,
            } => {
                let shipment = self.shipment(awb_number)?;
                let house = shipment
                    .house_shipments
                    .iter()
                    .find(|h| &h.hawb_number == hawb_number)?;
                Some(SelectedItem::Hawb {
                    awb_number: awb_number.clone(),
                    house: house.clone(),
                })
            }
        }
    }
}

/// Reference to an item the user clicked in the shipment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemRef {
    Uld { awb_number: String, uld_id: String },
    Hawb { awb_number: String, hawb_number: String },
}

/// The item shown in the detail pane. The variant is fixed when it is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SelectedItem {
    Uld { awb_number: String, content: UldContent },
    Hawb { awb_number: String, house: HouseShipment },
}

impl SelectedItem {
    pub fn awb_number(&self) -> &str {
        match self {
            SelectedItem::Uld { awb_number, .. } | SelectedItem::Hawb { awb_number, .. } => {
                awb_number
            }
        }
    }
}
