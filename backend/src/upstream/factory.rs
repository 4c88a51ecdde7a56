//! Manifest source factory.

use std::sync::Arc;

use super::config::{SourceKind, UpstreamConfig};
use super::error::UpstreamResult;
use super::http_source::HttpManifestSource;
use super::local::LocalManifestSource;
use super::source::ManifestSource;

/// Builds the [`ManifestSource`] named by a configuration.
pub struct SourceFactory;

impl SourceFactory {
    pub fn create(config: &UpstreamConfig) -> UpstreamResult<Arc<dyn ManifestSource>> {
        match config.source_kind() {
            SourceKind::Http => {
                let source = HttpManifestSource::new(config)?;
                log::info!(
                    "Using manifest API at {} (collection '{}')",
                    source.base_url(),
                    config.collection
                );
                Ok(Arc::new(source))
            }
            SourceKind::Local => Self::create_local(config),
        }
    }

    /// In-memory source, seeded from `seed_file` when one is configured.
    pub fn create_local(config: &UpstreamConfig) -> UpstreamResult<Arc<dyn ManifestSource>> {
        let source = match &config.seed_file {
            Some(path) => LocalManifestSource::from_seed_file(path)?,
            None => {
                log::info!("Using empty in-memory manifest source");
                LocalManifestSource::new()
            }
        };
        Ok(Arc::new(source))
    }

    /// Resolve configuration from file and environment, then build.
    pub fn from_env() -> UpstreamResult<Arc<dyn ManifestSource>> {
        Self::create(&UpstreamConfig::load()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_local() {
        let source = SourceFactory::create(&UpstreamConfig::default()).unwrap();
        assert_eq!(source.kind(), "local");
    }

    #[test]
    fn test_http_without_url_fails() {
        let config = UpstreamConfig {
            source: Some(SourceKind::Http),
            ..UpstreamConfig::default()
        };
        assert!(SourceFactory::create(&config).is_err());
    }

    #[test]
    fn test_missing_seed_file_fails() {
        let config = UpstreamConfig {
            seed_file: Some("/definitely/not/here.json".into()),
            ..UpstreamConfig::default()
        };
        assert!(SourceFactory::create(&config).is_err());
    }
}
