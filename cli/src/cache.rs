#![deny(missing_docs)]

//! # Gateway Cache
//!
//! File-backed [`SpecCache`] that keeps the last good document of every gateway
//! service between runs, and the `cache` command that inspects or clears it.
//!
//! One JSON file per cache key, holding the document and its expiry as a Unix
//! timestamp (`null` when the TTL is too large to represent).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use openswag_core::config::OpenSwagConfig;
use openswag_core::gateway::service::CACHE_KEY_PREFIX;
use openswag_core::{AppError, AppResult, SpecCache};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments for the cache command.
#[derive(clap::Args, Debug, Clone)]
pub struct CacheArgs {
    /// Remove every cached service document.
    #[clap(long)]
    pub clear: bool,

    /// Cache directory. Defaults to `gateway.cacheDir` from the configuration.
    #[clap(long)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    expires_at: Option<u64>,
    document: Value,
}

/// Persists service documents as one JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl FileCache {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file))
    }

    /// Cache files currently on disk, sorted by name. A missing directory has none.
    pub fn entries(&self) -> AppResult<Vec<PathBuf>> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::General(format!(
                    "Failed to read cache dir {:?}: {}",
                    self.dir, e
                )))
            }
        };

        let mut entries: Vec<PathBuf> = dir
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(CACHE_KEY_PREFIX) && name.ends_with(".json"))
            })
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Deletes every cache file and returns how many were removed.
    pub fn clear(&self) -> AppResult<usize> {
        let entries = self.entries()?;
        for path in &entries {
            fs::remove_file(path)
                .map_err(|e| AppError::General(format!("Failed to remove {:?}: {}", path, e)))?;
        }
        tracing::info!(dir = ?self.dir, removed = entries.len(), "cleared gateway cache");
        Ok(entries.len())
    }

    fn write_entry(&self, key: &str, entry: &CacheFile) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec(entry).map_err(io::Error::other)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)
    }
}

impl SpecCache for FileCache {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(?path, error = %e, "cache read failure");
                return None;
            }
        };

        let entry: CacheFile = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(?path, error = %e, "ignoring corrupt cache entry");
                return None;
            }
        };

        if entry.expires_at.is_some_and(|at| at <= unix_now()) {
            tracing::debug!(key, "cache entry expired");
            return None;
        }
        Some(entry.document)
    }

    fn set(&self, key: &str, document: Value, ttl: Duration) {
        let entry = CacheFile {
            expires_at: unix_now().checked_add(ttl.as_secs()),
            document,
        };
        if let Err(e) = self.write_entry(key, &entry) {
            tracing::warn!(key, error = %e, "cache write failure");
        }
    }
}

/// Resolves the cache directory: the explicit flag, else the configured one.
fn cache_dir<'a>(args: &'a CacheArgs, config: &'a OpenSwagConfig) -> &'a Path {
    args.cache_dir
        .as_deref()
        .unwrap_or(config.gateway.cache_dir.as_path())
}

/// Executes the cache command: clears with `--clear`, otherwise lists cached entries.
pub fn execute(args: &CacheArgs, config: &OpenSwagConfig) -> AppResult<()> {
    let cache = FileCache::new(cache_dir(args, config));

    if args.clear {
        let removed = cache.clear()?;
        println!("Cleared {} cached service document(s) from {:?}", removed, cache.dir);
        return Ok(());
    }

    let entries = cache.entries()?;
    if entries.is_empty() {
        println!("No cached service documents in {:?}", cache.dir);
    }
    for path in entries {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openswag_core::{FetchError, GatewayAggregator, ServiceConfig, SpecSource};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    struct FixedSource {
        healthy: bool,
        document: Value,
    }

    impl SpecSource for FixedSource {
        fn check_health(&self, _url: &str, _timeout: Duration) -> bool {
            self.healthy
        }

        fn fetch(&self, _url: &str, _timeout: Duration) -> Result<Value, FetchError> {
            Ok(self.document.clone())
        }
    }

    fn services() -> Vec<ServiceConfig> {
        vec![ServiceConfig::new("users", "http://users/openapi.json").with_prefix("users")]
    }

    #[test]
    fn test_fallback_survives_across_runs() {
        let dir = tempdir().unwrap();
        let doc = json!({"paths": {"/me": {"get": {}}}});

        let first = GatewayAggregator::new(
            services(),
            FixedSource {
                healthy: true,
                document: doc.clone(),
            },
        )
        .with_cache(Arc::new(FileCache::new(dir.path())));
        assert_eq!(first.fetch_all()["users"], doc);

        let second = GatewayAggregator::new(
            services(),
            FixedSource {
                healthy: false,
                document: json!({}),
            },
        )
        .with_cache(Arc::new(FileCache::new(dir.path())));
        let merged = second.aggregated_spec();
        assert!(merged["paths"]["/users/me"]["get"].is_object());
    }

    #[test]
    fn test_expired_and_corrupt_entries_ignored() {
        let dir = tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        cache.set("openswag_gateway_a", json!({"v": 1}), Duration::ZERO);
        assert!(cache.get("openswag_gateway_a").is_none());

        fs::write(dir.path().join("openswag_gateway_b.json"), "{not json").unwrap();
        assert!(cache.get("openswag_gateway_b").is_none());

        assert!(cache.get("openswag_gateway_missing").is_none());
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let dir = tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.set("openswag_gateway_a", json!({"v": 1}), Duration::from_secs(u64::MAX));

        let stored: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("openswag_gateway_a.json")).unwrap())
                .unwrap();
        assert_eq!(stored["expiresAt"], Value::Null);
        assert_eq!(cache.get("openswag_gateway_a"), Some(json!({"v": 1})));
    }

    #[test]
    fn test_key_is_sanitized_into_file_name() {
        let cache = FileCache::new("/tmp/cache");
        assert_eq!(
            cache.entry_path("openswag_gateway_a/b c"),
            PathBuf::from("/tmp/cache/openswag_gateway_a_b_c.json")
        );
    }

    #[test]
    fn test_clear_removes_only_cache_files() {
        let dir = tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("cache"));
        assert_eq!(cache.clear().unwrap(), 0);

        cache.set("openswag_gateway_a", json!({}), Duration::from_secs(60));
        cache.set("openswag_gateway_b", json!({}), Duration::from_secs(60));
        fs::write(dir.path().join("cache/notes.txt"), "keep").unwrap();

        let args = CacheArgs {
            clear: true,
            cache_dir: Some(dir.path().join("cache")),
        };
        execute(&args, &OpenSwagConfig::default()).unwrap();

        assert!(cache.entries().unwrap().is_empty());
        assert!(dir.path().join("cache/notes.txt").exists());
    }

    #[test]
    fn test_cache_dir_defaults_to_config() {
        let mut config = OpenSwagConfig::default();
        config.gateway.cache_dir = PathBuf::from("/srv/cache");
        let args = CacheArgs {
            clear: false,
            cache_dir: None,
        };
        assert_eq!(cache_dir(&args, &config), Path::new("/srv/cache"));
    }
}
