//! Property tests for manifest aggregation.

mod support;

use std::collections::HashSet;

use manifest_viewer::services::transform_manifest;
use proptest::prelude::*;
use serde_json::{json, Value};

fn masterbill() -> impl Strategy<Value = (String, Vec<Vec<u32>>)> {
    (
        prop::sample::select(vec!["176-1", "176-2", "176-3", ""]),
        prop::collection::vec(prop::collection::vec(0u32..500, 0..4), 0..3),
    )
        .prop_map(|(awb, houses)| (awb.to_string(), houses))
}

fn document() -> impl Strategy<Value = Vec<Vec<(String, Vec<Vec<u32>>)>>> {
    prop::collection::vec(prop::collection::vec(masterbill(), 0..4), 0..4)
}

fn to_json(containers: &[Vec<(String, Vec<Vec<u32>>)>]) -> Value {
    let containers: Vec<Value> = containers
        .iter()
        .enumerate()
        .map(|(i, masterbills)| {
            let masterbills: Vec<Value> = masterbills
                .iter()
                .map(|(awb, houses)| {
                    let housebills: Vec<Value> = houses
                        .iter()
                        .enumerate()
                        .map(|(h, pieces)| {
                            let pieces: Vec<Value> =
                                pieces.iter().map(|w| json!({"weight": w})).collect();
                            json!({"housebillNumber": format!("H{}-{}", i, h), "pieces": pieces})
                        })
                        .collect();
                    json!({"masterbillNumber": awb, "housebills": housebills})
                })
                .collect();
            json!({"containerNumber": format!("ULD{}", i), "masterbills": masterbills})
        })
        .collect();
    json!({"id": "prop", "containers": containers})
}

fn expected_weight(containers: &[Vec<(String, Vec<Vec<u32>>)>]) -> f64 {
    containers
        .iter()
        .flatten()
        .filter(|(awb, _)| !awb.is_empty())
        .flat_map(|(_, houses)| houses.iter().flatten())
        .map(|w| *w as f64)
        .sum()
}

proptest! {
    #[test]
    fn totals_equal_sum_of_shipments(containers in document()) {
        let manifest = transform_manifest(&to_json(&containers));

        let pieces: u64 = manifest.shipments.iter().map(|s| s.pieces).sum();
        let weight: f64 = manifest.shipments.iter().map(|s| s.weight.value).sum();
        prop_assert_eq!(manifest.total_pieces, pieces);
        prop_assert!((manifest.total_weight.value - weight).abs() < 1e-6);
        prop_assert!((manifest.total_weight.value - expected_weight(&containers)).abs() < 1e-6);
    }

    #[test]
    fn awb_numbers_are_unique_and_non_empty(containers in document()) {
        let manifest = transform_manifest(&to_json(&containers));
        let mut seen = HashSet::new();
        for shipment in &manifest.shipments {
            prop_assert!(!shipment.awb_number.is_empty());
            prop_assert!(seen.insert(shipment.awb_number.clone()));
        }
    }

    #[test]
    fn uld_contents_add_up_to_shipment(containers in document()) {
        let manifest = transform_manifest(&to_json(&containers));
        for shipment in &manifest.shipments {
            let uld_pieces: u64 = shipment.uld_contents.iter().map(|u| u.pieces).sum();
            let uld_weight: f64 = shipment.uld_contents.iter().map(|u| u.weight.value).sum();
            prop_assert_eq!(uld_pieces, shipment.pieces);
            prop_assert!((uld_weight - shipment.weight.value).abs() < 1e-6);

            let house_weight: f64 = shipment.house_shipments.iter().map(|h| h.actual_weight_kg).sum();
            prop_assert!((house_weight - shipment.weight.value).abs() < 1e-6);
        }
    }

    #[test]
    fn transformation_is_deterministic(containers in document()) {
        let doc = to_json(&containers);
        prop_assert_eq!(transform_manifest(&doc), transform_manifest(&doc));
    }
}

#[test]
fn test_two_container_fixture() {
    let manifest = transform_manifest(&support::two_container_document("m1"));

    assert_eq!(manifest.manifest_number, "MAN-m1");
    assert_eq!(manifest.flight_details.flight_number, "LH8160");
    assert_eq!(manifest.shipments.len(), 2);

    let first = &manifest.shipments[0];
    assert_eq!(first.awb_number, "020-11111111");
    assert_eq!(first.pieces, 4);
    assert!((first.weight.value - 185.5).abs() < 1e-9);
    assert_eq!(first.nature_of_goods, "AUTO PARTS");
    assert_eq!(first.special_handling_codes, vec!["ELI", "HEA"]);
    assert_eq!(first.house_shipments.len(), 3);
    assert_eq!(first.house_shipments[0].customer, "Bosch");

    let ulds: Vec<(&str, u64)> = first
        .uld_contents
        .iter()
        .map(|u| (u.uld_id.as_str(), u.pieces))
        .collect();
    assert_eq!(ulds, vec![("PMC10001LH", 3), ("AKE20002LH", 1)]);

    let second = &manifest.shipments[1];
    assert_eq!(second.awb_number, "020-22222222");
    assert_eq!(second.special_handling_codes, vec!["COL", "PIL"]);

    assert_eq!(manifest.total_pieces, 6);
    assert!((manifest.total_weight.value - 245.5).abs() < 1e-9);
}
