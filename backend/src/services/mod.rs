//! Service layer: manifest aggregation and the chart engine.
//!
//! Services are pure functions over already-fetched data. They never touch the
//! network; handlers fetch through [`crate::upstream`] and pass documents in.

pub mod aggregator;
pub mod assistant;
pub mod chart;
pub mod chart_data;
pub mod chart_options;
pub mod chart_spec;
pub mod fields;
pub mod filter;

pub use aggregator::{transform_document, transform_manifest};
pub use assistant::{render_reply, AssistantRender, ManifestSummary, APOLOGY_MESSAGE};
pub use chart::{render_chart, ChartRender};
pub use chart_data::{build_rows, shape_series, SeriesPoint};
pub use chart_spec::{Aggregate, ChartSpec, ChartSpecError, ChartType, Filter, FilterOp, SortDirection};
pub use fields::{get_field, normalize_field, DataSource};
pub use filter::apply_filters;
