//! Manifest source configuration.
//!
//! Settings come from an optional `manifest-viewer.toml` file and from
//! environment variables. Environment variables win over the file.
//!
//! ```toml
//! [upstream]
//! source = "http"
//! api_url = "https://manifests.example.com"
//! api_key = "..."
//! collection = "manifests"
//! timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::{UpstreamError, UpstreamResult};

pub const CONFIG_FILE_NAME: &str = "manifest-viewer.toml";
pub const DEFAULT_COLLECTION: &str = "manifests";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which [`ManifestSource`](super::ManifestSource) implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// External manifest API over HTTP.
    Http,
    /// In-memory documents, optionally seeded from a JSON file.
    Local,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" | "remote" | "api" => Ok(Self::Http),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown manifest source: {}", s)),
        }
    }
}

/// Resolved manifest source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Explicit source kind; inferred from `api_url` when unset.
    #[serde(default)]
    pub source: Option<SourceKind>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            source: None,
            api_url: None,
            api_key: None,
            collection: default_collection(),
            timeout_secs: default_timeout_secs(),
            seed_file: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    upstream: UpstreamConfig,
}

impl UpstreamConfig {
    /// Build a configuration from environment variables only.
    ///
    /// # Environment Variables
    /// - `MANIFEST_SOURCE`: `http` | `local`
    /// - `MANIFEST_API_URL`: base URL of the external manifest API
    /// - `MANIFEST_API_KEY`: static API key
    /// - `MANIFEST_COLLECTION` (default: `manifests`)
    /// - `MANIFEST_API_TIMEOUT_SECS` (default: 30)
    /// - `MANIFEST_SEED_FILE`: JSON array of raw documents for the local source
    pub fn from_env() -> UpstreamResult<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load the `[upstream]` table of a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> UpstreamResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            UpstreamError::config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let file: ConfigFile = toml::from_str(&content)
            .map_err(|e| UpstreamError::config(format!("Failed to parse config file: {}", e)))?;
        Ok(file.upstream)
    }

    /// Load the configuration file from the standard locations.
    ///
    /// Searches for `manifest-viewer.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> UpstreamResult<Self> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ];

        for path in &search_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Err(UpstreamError::config(format!(
            "No {} found in standard locations",
            CONFIG_FILE_NAME
        )))
    }

    /// Resolve the effective configuration for the server.
    ///
    /// `MANIFEST_CONFIG` names the file explicitly; otherwise the standard
    /// locations are searched and a missing file is not an error.
    pub fn load() -> UpstreamResult<Self> {
        let base = match std::env::var("MANIFEST_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::from_default_location().unwrap_or_else(|e| {
                log::debug!("{}; using defaults", e);
                Self::default()
            }),
        };
        base.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay variables from `lookup` on top of `self`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> UpstreamResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(source) = non_empty("MANIFEST_SOURCE") {
            self.source = Some(source.parse().map_err(UpstreamError::config)?);
        }
        if let Some(url) = non_empty("MANIFEST_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(key) = non_empty("MANIFEST_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(collection) = non_empty("MANIFEST_COLLECTION") {
            self.collection = collection;
        }
        if let Some(timeout) = non_empty("MANIFEST_API_TIMEOUT_SECS") {
            self.timeout_secs = timeout.trim().parse().map_err(|_| {
                UpstreamError::config("MANIFEST_API_TIMEOUT_SECS must be a whole number of seconds")
            })?;
        }
        if let Some(seed) = non_empty("MANIFEST_SEED_FILE") {
            self.seed_file = Some(PathBuf::from(seed));
        }
        Ok(self)
    }

    /// Effective source kind: explicit, else HTTP when a URL is configured.
    pub fn source_kind(&self) -> SourceKind {
        self.source.unwrap_or(if self.api_url.is_some() {
            SourceKind::Http
        } else {
            SourceKind::Local
        })
    }

    /// Value of the `Authorization` header, if a key is configured.
    ///
    /// The key is sent as `users API-Key <KEY>`; the prefix is added when the
    /// configured value lacks it.
    pub fn authorization_header(&self) -> Option<String> {
        let key = self.api_key.as_deref()?.trim();
        if key.is_empty() {
            None
        } else if key.starts_with("users API-Key ") {
            Some(key.to_string())
        } else {
            Some(format!("users API-Key {}", key))
        }
    }
}
