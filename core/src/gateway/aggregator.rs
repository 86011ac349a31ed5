#![deny(missing_docs)]

//! # Gateway Aggregation
//!
//! Fetches each registered service's OpenAPI document and merges the survivors.
//!
//! Every service is handled independently on its own scoped thread:
//! health check, fetch with timeout, then cache write on success. A failure at any
//! step falls back to the last cached document for that service, or drops the
//! service from the merge when nothing is cached. One unhealthy service never blocks
//! or fails the others.
//!
//! Transport is abstracted behind [`SpecSource`] so the core performs no I/O of its
//! own; the CLI supplies an HTTP implementation.

use crate::config::GatewayConfig;
use crate::gateway::merger::GatewayMerger;
use crate::gateway::ServiceConfig;
use derive_more::Display;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

/// Why fetching a service document failed.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum FetchError {
    /// Connection, DNS, timeout or read failure.
    #[display("transport error: {_0}")]
    Transport(String),
    /// The service answered with a non-2xx status.
    #[display("HTTP {_0}")]
    Status(u16),
    /// The body did not decode to a JSON object.
    #[display("response body is not a structured document")]
    InvalidBody,
}

impl std::error::Error for FetchError {}

/// Why a service produced no fresh document in this aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Skipped {
    /// The health probe failed.
    #[display("health check failed")]
    Unhealthy,
    /// The document fetch failed.
    #[display("{_0}")]
    Failed(FetchError),
}

/// Transport used to probe and download service documents.
pub trait SpecSource: Send + Sync {
    /// Returns true when `url` answers with a 2xx status within `timeout`.
    fn check_health(&self, url: &str, timeout: Duration) -> bool;

    /// Downloads and decodes the JSON document at `url`.
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Value, FetchError>;
}

/// Per-service document cache used as the degradation fallback.
///
/// Implementations must tolerate concurrent reads and writes; concurrent writes to
/// the same key resolve as last write wins.
pub trait SpecCache: Send + Sync {
    /// Returns the cached document for `key`, if present and fresh.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `document` under `key` for `ttl`.
    fn set(&self, key: &str, document: Value, ttl: Duration);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    document: Value,
    /// `None` when the TTL runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process [`SpecCache`] guarded by an `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(_) => tracing::warn!("cache lock poisoned, clear skipped"),
        }
    }
}

impl SpecCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(_) => {
                tracing::warn!(key, "cache read failure: lock poisoned");
                return None;
            }
        };
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(Instant::now()))
            .map(|entry| entry.document.clone())
    }

    fn set(&self, key: &str, document: Value, ttl: Duration) {
        let entry = CacheEntry {
            document,
            expires_at: Instant::now().checked_add(ttl),
        };
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), entry);
            }
            Err(_) => tracing::warn!(key, "cache write failure: lock poisoned"),
        }
    }
}

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches, caches and merges service documents.
pub struct GatewayAggregator<S: SpecSource> {
    merger: GatewayMerger,
    source: S,
    cache: Option<Arc<dyn SpecCache>>,
    cache_ttl: Duration,
    timeout: Duration,
}

impl<S: SpecSource> GatewayAggregator<S> {
    /// Creates an aggregator without a cache, using default TTL and timeout.
    pub fn new(services: Vec<ServiceConfig>, source: S) -> Self {
        Self {
            merger: GatewayMerger::new(services),
            source,
            cache: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates an aggregator from the gateway section of the configuration.
    pub fn from_config(config: &GatewayConfig, source: S) -> Self {
        Self::new(config.services.clone(), source)
            .with_cache_ttl(config.cache_ttl())
            .with_timeout(config.timeout())
    }

    /// Attaches a fallback cache.
    pub fn with_cache(mut self, cache: Arc<dyn SpecCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets how long fetched documents stay cached.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the per-request timeout for health checks and fetches.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The merger used by [`Self::aggregated_spec`].
    pub fn merger(&self) -> &GatewayMerger {
        &self.merger
    }

    /// Fetches every service concurrently.
    ///
    /// Returns the documents that are available (fresh or cached), keyed by service
    /// name, in service declaration order.
    pub fn fetch_all(&self) -> IndexMap<String, Value> {
        let services = self.merger.services();

        let results: Vec<Option<Value>> = thread::scope(|scope| {
            let handles: Vec<_> = services
                .iter()
                .map(|service| scope.spawn(move || self.fetch_service(service)))
                .collect();

            handles
                .into_iter()
                .zip(services)
                .map(|(handle, service)| {
                    handle.join().unwrap_or_else(|_| {
                        tracing::error!(service = %service.name, "fetch worker panicked");
                        None
                    })
                })
                .collect()
        });

        services
            .iter()
            .zip(results)
            .filter_map(|(service, doc)| doc.map(|doc| (service.name.clone(), doc)))
            .collect()
    }

    /// Fetches every service and merges the available documents.
    pub fn aggregated_spec(&self) -> Value {
        self.merger.merge(&self.fetch_all())
    }

    /// Health check then fetch, without any cache involvement.
    pub fn fetch_fresh(&self, service: &ServiceConfig) -> Result<Value, Skipped> {
        if !self
            .source
            .check_health(service.health_check_url(), self.timeout)
        {
            return Err(Skipped::Unhealthy);
        }

        let document = self
            .source
            .fetch(&service.url, self.timeout)
            .map_err(Skipped::Failed)?;

        if !document.is_object() {
            return Err(Skipped::Failed(FetchError::InvalidBody));
        }
        Ok(document)
    }

    fn fetch_service(&self, service: &ServiceConfig) -> Option<Value> {
        let key = service.cache_key();

        match self.fetch_fresh(service) {
            Ok(document) => {
                if let Some(cache) = &self.cache {
                    cache.set(&key, document.clone(), self.cache_ttl);
                }
                tracing::debug!(service = %service.name, "fetched service document");
                Some(document)
            }
            Err(reason) => {
                match &reason {
                    Skipped::Unhealthy => tracing::warn!(
                        service = %service.name,
                        "health check failed, attempting cache fallback"
                    ),
                    Skipped::Failed(error) => tracing::error!(
                        service = %service.name,
                        %error,
                        "failed to fetch spec, attempting cache fallback"
                    ),
                }
                self.cached(&key, service, &reason)
            }
        }
    }

    fn cached(&self, key: &str, service: &ServiceConfig, reason: &Skipped) -> Option<Value> {
        let cached = self.cache.as_ref().and_then(|cache| cache.get(key));
        match &cached {
            Some(_) => tracing::warn!(
                service = %service.name,
                %reason,
                "serving cached document"
            ),
            None => tracing::warn!(
                service = %service.name,
                %reason,
                "no cached document, service omitted from aggregation"
            ),
        }
        cached
    }
}
