//! Assistant integration: the manifest context handed to the chat model and
//! the rendering of its replies.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::chart::{render_chart, ChartRender};
use super::chart_spec::{strip_chart_blocks, ChartSpec};
use crate::models::ManifestData;

/// Reply shown when the assistant round trip fails.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I ran into a problem answering that. Please try again.";

/// One line per master shipment in the assistant context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentLine {
    pub awb: String,
    pub pieces: u64,
    pub weight: f64,
}

/// Compact view of a manifest for the chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSummary {
    pub manifest_number: String,
    pub flight_number: String,
    pub route: String,
    pub total_pieces: u64,
    pub total_weight_kg: f64,
    pub shipment_count: usize,
    pub uld_ids: Vec<String>,
    pub special_handling_codes: Vec<String>,
    pub shipments: Vec<ShipmentLine>,
}

impl ManifestSummary {
    pub fn from_manifest(manifest: &ManifestData) -> Self {
        let flight = &manifest.flight_details;

        let mut uld_ids: Vec<String> = Vec::new();
        for content in manifest.shipments.iter().flat_map(|s| &s.uld_contents) {
            if !uld_ids.contains(&content.uld_id) {
                uld_ids.push(content.uld_id.clone());
            }
        }

        let codes: BTreeSet<&String> = manifest
            .shipments
            .iter()
            .flat_map(|s| &s.special_handling_codes)
            .collect();

        Self {
            manifest_number: manifest.manifest_number.clone(),
            flight_number: flight.flight_number.clone(),
            route: format!("{} -> {}", flight.departure_airport, flight.arrival_airport),
            total_pieces: manifest.total_pieces,
            total_weight_kg: manifest.total_weight.value,
            shipment_count: manifest.shipments.len(),
            uld_ids,
            special_handling_codes: codes.into_iter().cloned().collect(),
            shipments: manifest
                .shipments
                .iter()
                .map(|s| ShipmentLine {
                    awb: s.awb_number.clone(),
                    pieces: s.pieces,
                    weight: s.weight.value,
                })
                .collect(),
        }
    }
}

/// Assistant reply split into prose and rendered charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantRender {
    pub text: String,
    pub charts: Vec<ChartRender>,
}

impl AssistantRender {
    pub fn apology() -> Self {
        Self {
            text: APOLOGY_MESSAGE.to_string(),
            charts: Vec::new(),
        }
    }
}

/// Render the chart blocks of an assistant reply against `manifest`.
///
/// Specifications that fail validation are dropped; the prose is kept.
pub fn render_reply(manifest: &ManifestData, reply: &str) -> AssistantRender {
    let charts = ChartSpec::extract_from_reply(reply)
        .iter()
        .filter_map(|spec| match render_chart(manifest, spec) {
            Ok(render) => Some(render),
            Err(e) => {
                log::warn!("Dropping chart for manifest {}: {}", manifest.id, e);
                None
            }
        })
        .collect();

    AssistantRender {
        text: strip_chart_blocks(reply),
        charts,
    }
}
