//! Chart rendering pipeline: specification in, renderer option out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chart_data::{build_rows, shape_series};
use super::chart_options::{
    chart_title, heatmap_option, histogram_option, scatter_option, series_option,
    stacked_bar_option, treemap_option,
};
use super::chart_spec::{ChartSpec, ChartSpecError, ChartType};
use super::filter::apply_filters;
use crate::models::ManifestData;

pub const NO_DATA_MESSAGE: &str = "No data matches this chart.";

/// Outcome of rendering one chart specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartRender {
    Chart { title: String, option: Value },
    NoData { title: String, message: String },
}

impl ChartRender {
    pub fn title(&self) -> &str {
        match self {
            ChartRender::Chart { title, .. } | ChartRender::NoData { title, .. } => title,
        }
    }

    pub fn is_chart(&self) -> bool {
        matches!(self, ChartRender::Chart { .. })
    }
}

/// Render `spec` against a manifest.
///
/// The specification is normalized and validated first. An empty dataset at
/// any stage yields [`ChartRender::NoData`] rather than an error.
pub fn render_chart(manifest: &ManifestData, spec: &ChartSpec) -> Result<ChartRender, ChartSpecError> {
    let spec = spec.normalized();
    spec.validate()?;

    let title = chart_title(&spec);
    let rows = build_rows(manifest, spec.source);

    let option = if spec.chart_type.uses_series() {
        series_option(&spec, &shape_series(&spec, rows))
    } else {
        let rows = apply_filters(rows, &spec.filters);
        match spec.chart_type {
            ChartType::StackedBar => stacked_bar_option(&spec, &rows),
            ChartType::Scatter => scatter_option(&spec, &rows),
            ChartType::Histogram => histogram_option(&spec, &rows),
            ChartType::Heatmap => heatmap_option(&spec, &rows),
            ChartType::Treemap => treemap_option(&spec, &rows),
            ChartType::Bar | ChartType::Line | ChartType::Pie => None,
        }
    };

    Ok(match option {
        Some(option) => ChartRender::Chart { title, option },
        None => {
            log::debug!(
                "No data for {:?} chart over {} in manifest {}",
                spec.chart_type,
                spec.source,
                manifest.id
            );
            ChartRender::NoData {
                title,
                message: NO_DATA_MESSAGE.to_string(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlightDetails, HouseShipment, Shipment, UldContent, Weight};
    use crate::services::chart_spec::{Filter, FilterOp};
    use crate::services::fields::DataSource;
    use serde_json::json;

    fn manifest() -> ManifestData {
        let shipment = |awb: &str, pieces: u64, kg: f64, goods: &str| Shipment {
            awb_number: awb.to_string(),
            pieces,
            weight: Weight::kg(kg),
            nature_of_goods: goods.to_string(),
            special_handling_codes: vec![],
            storage_instructions: None,
            uld_contents: vec![UldContent {
                uld_id: format!("ULD-{}", awb),
                pieces,
                weight: Weight::kg(kg),
            }],
            house_shipments: vec![HouseShipment {
                hawb_number: format!("H-{}", awb),
                customer: "Acme".to_string(),
                origin: "FRA".to_string(),
                destination: "JFK".to_string(),
                pieces,
                actual_weight_kg: kg,
                chargeable_weight_kg: kg,
                remarks: None,
            }],
        };
        ManifestData::new(
            "m1".to_string(),
            "MAN-1".to_string(),
            FlightDetails::default(),
            vec![
                shipment("176-1", 2, 100.0, "BOOKS"),
                shipment("176-2", 1, 40.0, "TOYS"),
            ],
        )
    }

    #[test]
    fn test_bar_chart_renders() {
        let spec = ChartSpec::new(DataSource::Shipments, ChartType::Bar, "awb");
        let render = render_chart(&manifest(), &spec).unwrap();
        match render {
            ChartRender::Chart { option, .. } => {
                assert_eq!(option["xAxis"]["data"], json!(["176-1", "176-2"]));
                assert_eq!(option["series"][0]["data"], json!([100.0, 40.0]));
            }
            other => panic!("expected chart, got {:?}", other),
        }
    }

    #[test]
    fn test_everything_filtered_out_is_no_data() {
        let mut spec = ChartSpec::new(DataSource::Hawbs, ChartType::Scatter, "pieces");
        spec.filters = vec![Filter {
            field: "customer".to_string(),
            op: FilterOp::Eq,
            value: json!("Nobody"),
        }];
        let render = render_chart(&manifest(), &spec).unwrap();
        assert!(!render.is_chart());
        assert_eq!(
            serde_json::to_value(&render).unwrap()["kind"],
            json!("no_data")
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let spec = ChartSpec::new(DataSource::Ulds, ChartType::Pie, "customer");
        assert_eq!(
            render_chart(&manifest(), &spec),
            Err(ChartSpecError::UnknownField {
                field: "customer".to_string(),
                source_name: "ulds".to_string(),
            })
        );
    }

    #[test]
    fn test_treemap_reads_house_rows() {
        let spec = ChartSpec::new(DataSource::Shipments, ChartType::Treemap, "");
        let render = render_chart(&manifest(), &spec).unwrap();
        let ChartRender::Chart { option, .. } = render else {
            panic!("expected chart");
        };
        assert_eq!(option["series"][0]["data"][0]["children"][0]["name"], "H-176-1");
    }

    #[test]
    fn test_every_chart_type_renders() {
        for chart_type in [
            ChartType::Bar,
            ChartType::Line,
            ChartType::Pie,
            ChartType::StackedBar,
            ChartType::Scatter,
            ChartType::Histogram,
            ChartType::Heatmap,
            ChartType::Treemap,
        ] {
            let spec = ChartSpec::new(DataSource::Shipments, chart_type, "");
            let render = render_chart(&manifest(), &spec).unwrap();
            assert!(render.is_chart(), "{:?} did not render", chart_type);
        }
    }
}
