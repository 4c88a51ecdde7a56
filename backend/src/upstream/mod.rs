//! Access to raw manifest documents.
//!
//! ```text
//! handlers ──► ManifestSource (trait)
//!                 ├── HttpManifestSource   external manifest API (reqwest)
//!                 └── LocalManifestSource  in-memory documents
//! ```
//!
//! [`SourceFactory`] picks the implementation from [`UpstreamConfig`].

pub mod config;
pub mod error;
pub mod factory;
pub mod http_source;
pub mod local;
pub mod source;

pub use config::{SourceKind, UpstreamConfig};
pub use error::{UpstreamError, UpstreamResult};
pub use factory::SourceFactory;
pub use http_source::HttpManifestSource;
pub use local::LocalManifestSource;
pub use source::ManifestSource;
