//! Manifest aggregation.
//!
//! Converts one raw upstream document (containers → masterbills → housebills →
//! pieces) into the flat [`ManifestData`] model. Every masterbill becomes a
//! contribution keyed by its AWB number; contributions are folded into a
//! per-AWB ledger and the ledger is finalized into shipments.
//!
//! The aggregator never fails. Unreadable input degrades to empty shipments.
//!
//! Container weight is allocated by piece share: a ULD holding `n` of a
//! masterbill's `N` pieces gets `n / N` of the housebill weight. This assumes
//! pieces weigh the same, which the feed does not guarantee.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::models::{
    FlightDetails, HouseShipment, ManifestData, RawContainer, RawManifestDocument, RawMasterbill,
    Shipment, UldContent, Weight, UNKNOWN_ULD,
};

/// Origin and destination inherited by every house shipment.
#[derive(Debug, Clone, Default)]
struct Route {
    origin: String,
    destination: String,
}

/// What one masterbill adds to its AWB.
#[derive(Debug, Clone)]
struct Contribution {
    awb_number: String,
    nature_of_goods: String,
    storage_instructions: Option<String>,
    pieces: u64,
    weight: f64,
    ulds: Vec<(String, u64, f64)>,
    houses: Vec<HouseShipment>,
    shcs: Vec<String>,
}

/// Running totals of one AWB.
#[derive(Debug, Clone)]
struct AwbAccumulator {
    awb_number: String,
    nature_of_goods: String,
    storage_instructions: Option<String>,
    pieces: u64,
    weight: f64,
    ulds: Vec<(String, u64, f64)>,
    houses: Vec<HouseShipment>,
    shcs: BTreeSet<String>,
}

impl AwbAccumulator {
    fn open(contribution: &Contribution) -> Self {
        Self {
            awb_number: contribution.awb_number.clone(),
            nature_of_goods: contribution.nature_of_goods.clone(),
            storage_instructions: None,
            pieces: 0,
            weight: 0.0,
            ulds: Vec::new(),
            houses: Vec::new(),
            shcs: BTreeSet::new(),
        }
    }

    fn merge(&mut self, contribution: Contribution) {
        self.pieces += contribution.pieces;
        self.weight += contribution.weight;
        self.shcs.extend(contribution.shcs);
        self.houses.extend(contribution.houses);
        if self.storage_instructions.is_none() {
            self.storage_instructions = contribution.storage_instructions;
        }
        for (uld_id, pieces, weight) in contribution.ulds {
            match self.ulds.iter_mut().find(|(id, _, _)| *id == uld_id) {
                Some(entry) => {
                    entry.1 += pieces;
                    entry.2 += weight;
                }
                None => self.ulds.push((uld_id, pieces, weight)),
            }
        }
    }

    fn finish(self) -> Shipment {
        Shipment {
            awb_number: self.awb_number,
            pieces: self.pieces,
            weight: Weight::kg(self.weight),
            nature_of_goods: self.nature_of_goods,
            special_handling_codes: self.shcs.into_iter().collect(),
            storage_instructions: self.storage_instructions,
            uld_contents: self
                .ulds
                .into_iter()
                .map(|(uld_id, pieces, weight)| UldContent {
                    uld_id,
                    pieces,
                    weight: Weight::kg(weight),
                })
                .collect(),
            house_shipments: self.houses,
        }
    }
}

/// AWB accumulators in first-seen order.
#[derive(Debug, Default)]
struct Ledger {
    entries: Vec<AwbAccumulator>,
    index: HashMap<String, usize>,
}

impl Ledger {
    fn absorb(mut self, contribution: Contribution) -> Self {
        match self.index.get(&contribution.awb_number) {
            Some(&slot) => self.entries[slot].merge(contribution),
            None => {
                let mut opened = AwbAccumulator::open(&contribution);
                self.index
                    .insert(contribution.awb_number.clone(), self.entries.len());
                opened.merge(contribution);
                self.entries.push(opened);
            }
        }
        self
    }

    fn into_shipments(self) -> Vec<Shipment> {
        self.entries.into_iter().map(AwbAccumulator::finish).collect()
    }
}

/// Split a masterbill's housebill weight across the containers holding its pieces.
///
/// Pieces name their own container when they can; otherwise they belong to
/// `fallback_uld`. Without a piece list every piece counts toward `fallback_uld`.
fn allocate_uld_weight(mb: &RawMasterbill, fallback_uld: &str) -> Vec<(String, u64, f64)> {
    let mut counts: Vec<(String, u64)> = Vec::new();
    if mb.pieces.is_empty() {
        counts.push((fallback_uld.to_string(), mb.piece_count()));
    } else {
        for piece in &mb.pieces {
            let uld_id = piece.container_number.as_deref().unwrap_or(fallback_uld);
            match counts.iter_mut().find(|(id, _)| id == uld_id) {
                Some(entry) => entry.1 += 1,
                None => counts.push((uld_id.to_string(), 1)),
            }
        }
    }

    let divisor = counts.iter().map(|(_, n)| *n).sum::<u64>().max(1) as f64;
    let house_weight = mb.house_weight();

    counts
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(uld_id, n)| {
            let weight = house_weight * n as f64 / divisor;
            (uld_id, n, weight)
        })
        .collect()
}

fn house_shipments(mb: &RawMasterbill, route: &Route) -> Vec<HouseShipment> {
    mb.housebills
        .iter()
        .map(|hb| {
            let weight = hb.total_weight();
            HouseShipment {
                hawb_number: hb.housebill_number.clone().unwrap_or_default(),
                customer: hb.customer.clone(),
                origin: route.origin.clone(),
                destination: route.destination.clone(),
                pieces: hb.pieces.len() as u64,
                actual_weight_kg: weight,
                chargeable_weight_kg: weight,
                remarks: hb.remarks.clone(),
            }
        })
        .collect()
}

fn contribution(mb: &RawMasterbill, fallback_uld: &str, route: &Route) -> Option<Contribution> {
    let Some(awb_number) = mb.masterbill_number.clone() else {
        log::warn!(
            "Skipping masterbill without AWB number (container {})",
            fallback_uld
        );
        return None;
    };

    Some(Contribution {
        awb_number,
        nature_of_goods: mb.nature_of_goods.clone().unwrap_or_default(),
        storage_instructions: mb.storage_instructions.clone(),
        pieces: mb.piece_count(),
        weight: mb.house_weight(),
        ulds: allocate_uld_weight(mb, fallback_uld),
        houses: house_shipments(mb, route),
        shcs: mb.shcs.clone(),
    })
}

fn container_contributions<'a>(
    container: &'a RawContainer,
    route: &'a Route,
) -> impl Iterator<Item = Contribution> + 'a {
    container
        .masterbills
        .iter()
        .filter_map(move |mb| contribution(mb, container.uld_id(), route))
}

/// Aggregate a parsed document.
pub fn transform_document(doc: &RawManifestDocument) -> ManifestData {
    let info = &doc.info;
    let route = Route {
        origin: info.point_of_loading.clone().unwrap_or_default(),
        destination: info.point_of_unloading.clone().unwrap_or_default(),
    };

    let located: usize = doc.containers.iter().map(|c| c.masterbills.len()).sum();

    let ledger = if located > 0 {
        doc.containers
            .iter()
            .flat_map(|c| container_contributions(c, &route))
            .fold(Ledger::default(), Ledger::absorb)
    } else {
        if !doc.masterbills.is_empty() {
            log::warn!(
                "Manifest {}: no masterbills under containers, using {} top-level masterbills",
                doc.id,
                doc.masterbills.len()
            );
        }
        doc.masterbills
            .iter()
            .filter_map(|mb| contribution(mb, UNKNOWN_ULD, &route))
            .fold(Ledger::default(), Ledger::absorb)
    };

    let flight_details = FlightDetails {
        flight_number: info.flight_no.clone().unwrap_or_default(),
        departure_airport: route.origin.clone(),
        arrival_airport: route.destination.clone(),
        departure_date: info.flight_date.clone().unwrap_or_default(),
        arrival_date: info.arrival_date.clone().unwrap_or_default(),
    };

    let manifest_number = info.manifest_no.clone().unwrap_or_else(|| doc.id.clone());
    let shipments = ledger.into_shipments();
    log::debug!(
        "Manifest {} aggregated into {} shipments",
        manifest_number,
        shipments.len()
    );

    ManifestData::new(doc.id.clone(), manifest_number, flight_details, shipments)
}

/// Aggregate a raw upstream document.
pub fn transform_manifest(doc: &Value) -> ManifestData {
    transform_document(&RawManifestDocument::from_value(doc))
}

#[cfg(test)]
#[path = "aggregator_tests.rs"]
mod aggregator_tests;
