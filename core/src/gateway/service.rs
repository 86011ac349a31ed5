#![deny(missing_docs)]

//! # Service Configuration
//!
//! The immutable description of one upstream service taking part in gateway
//! aggregation.

use serde::{Deserialize, Serialize};

/// Prefix of the per-service cache key.
pub const CACHE_KEY_PREFIX: &str = "openswag_gateway_";

/// One upstream service whose OpenAPI document is merged into the gateway document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Unique service identifier. Used for tags, schema prefixes and cache keys.
    pub name: String,
    /// URL serving the service's OpenAPI JSON.
    pub url: String,
    /// Path prefix applied to every path of the service (e.g. `/users`).
    pub path_prefix: String,
    /// Optional health endpoint. Falls back to `url` when absent.
    pub health_url: Option<String>,
}

impl ServiceConfig {
    /// Creates a service entry without prefix or health endpoint.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the path prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Sets the health endpoint.
    pub fn with_health_url(mut self, url: impl Into<String>) -> Self {
        self.health_url = Some(url.into());
        self
    }

    /// The configured prefix with trailing slashes removed.
    pub fn normalized_prefix(&self) -> &str {
        self.path_prefix.trim_end_matches('/')
    }

    /// URL probed before fetching.
    pub fn health_check_url(&self) -> &str {
        self.health_url.as_deref().unwrap_or(&self.url)
    }

    /// Key under which the last good document is cached.
    pub fn cache_key(&self) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, self.name)
    }
}
