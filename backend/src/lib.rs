//! # Manifest Viewer Backend
//!
//! Backend for an air-cargo manifest dashboard.
//!
//! The crate proxies an external manifest API, reshapes raw manifest documents
//! into a shipment / ULD / house-waybill hierarchy and renders ad-hoc charts
//! requested by the dashboard's chat assistant.
//!
//! ## Features
//!
//! - **Manifest proxy**: paginated, filtered listing and detail fetch
//! - **Aggregation**: merge masterbills across containers into one shipment per AWB
//! - **Chart engine**: field normalization, filtering, aggregation and option
//!   building for eight chart types
//! - **HTTP API**: REST endpoints for the frontend
//!
//! ## Architecture
//!
//! - [`models`]: canonical manifest entities and lenient raw upstream shapes
//! - [`services`]: aggregation and the chart pipeline
//! - [`upstream`]: the `ManifestSource` seam, its configuration and implementations
//! - [`routes`]: route paths and request/response types
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod models;

pub mod routes;

pub mod services;

pub mod upstream;

#[cfg(feature = "http-server")]
pub mod http;
