//! HTTP server module for the manifest viewer backend.
//!
//! This module provides an axum-based HTTP server: a thin proxy in front of the
//! external manifest API plus the manifest aggregator and chart engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing and validation                         │
//! │  - CORS, compression, error handling                      │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (services/)                                │
//! │  - Manifest aggregation                                   │
//! │  - Chart specification, shaping and options               │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Manifest Source (upstream/)                              │
//! │  - HttpManifestSource / LocalManifestSource               │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, AppError};
pub use router::create_router;
pub use state::AppState;
