#![deny(missing_docs)]

//! # Configuration
//!
//! Static document metadata (`info`, `servers`, `tags`) and gateway settings,
//! loaded from a YAML or JSON file.
//!
//! Configuration is validated only for the "is this field non-empty" question;
//! the assembler handles defaults.

use crate::error::{AppError, AppResult};
use crate::gateway::ServiceConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `info.title`.
pub const ENV_TITLE: &str = "OPENSWAG_TITLE";
/// Environment variable overriding `info.version`.
pub const ENV_VERSION: &str = "OPENSWAG_VERSION";

/// `info.contact` settings. Empty fields are dropped on output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Contact name.
    pub name: String,
    /// Contact URL.
    pub url: String,
    /// Contact e-mail.
    pub email: String,
}

/// `info.license` settings. Empty fields are dropped on output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// License name.
    pub name: String,
    /// License URL.
    pub url: String,
}

/// `info` block settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoConfig {
    /// Document title; defaults to `API Documentation`.
    pub title: Option<String>,
    /// Document version; defaults to `1.0.0`.
    pub version: Option<String>,
    /// Optional description.
    pub description: String,
    /// Optional contact block.
    pub contact: Option<ContactConfig>,
    /// Optional license block.
    pub license: Option<LicenseConfig>,
}

/// Static metadata consumed by the [`SpecAssembler`](crate::assembler::SpecAssembler).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// `info` block.
    pub info: InfoConfig,
    /// Server objects, emitted verbatim.
    pub servers: Vec<Value>,
    /// Tag objects, emitted verbatim.
    pub tags: Vec<Value>,
}

impl DocumentConfig {
    /// Config with only a title and version.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: InfoConfig {
                title: Some(title.into()),
                version: Some(version.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_health_check_timeout() -> u64 {
    5
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".openswag/cache")
}

/// Gateway aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Whether remote services are aggregated into exported documents.
    pub enabled: bool,
    /// Registered services, in merge order.
    pub services: Vec<ServiceConfig>,
    /// Seconds a fetched document stays in the fallback cache.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,
    /// Seconds allowed for each health check and fetch.
    #[serde(default = "default_health_check_timeout")]
    pub health_check_timeout: u64,
    /// Directory holding the persisted per-service documents.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            services: Vec::new(),
            cache_ttl: default_cache_ttl(),
            health_check_timeout: default_health_check_timeout(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl GatewayConfig {
    /// Cache TTL as a `Duration`.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout)
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenSwagConfig {
    /// Document metadata (`info`, `servers`, `tags` at the file root).
    #[serde(flatten)]
    pub document: DocumentConfig,
    /// Gateway aggregation settings.
    pub gateway: GatewayConfig,
}

impl OpenSwagConfig {
    /// Parses a configuration from YAML (JSON is accepted as a YAML subset).
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::General(format!("Failed to read config {:?}: {}", path, e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Loads `path` if it exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> AppResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(?path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies `OPENSWAG_TITLE` / `OPENSWAG_VERSION` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies title/version overrides from an arbitrary lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(title) = lookup(ENV_TITLE).filter(|v| !v.is_empty()) {
            self.document.info.title = Some(title);
        }
        if let Some(version) = lookup(ENV_VERSION).filter(|v| !v.is_empty()) {
            self.document.info.version = Some(version);
        }
        self
    }

    fn validate(&self) -> AppResult<()> {
        let mut seen = HashSet::new();
        for service in &self.gateway.services {
            if service.name.is_empty() {
                return Err(AppError::General(
                    "Gateway service entries require a name".into(),
                ));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(AppError::General(format!(
                    "Duplicate gateway service name: {}",
                    service.name
                )));
            }
        }
        Ok(())
    }
}
