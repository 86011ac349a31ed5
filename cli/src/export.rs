#![deny(missing_docs)]

//! # Export Command
//!
//! Builds an OpenAPI document from an endpoint manifest and the configured metadata,
//! optionally grafting the aggregated gateway document on top.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use openswag_core::config::{GatewayConfig, OpenSwagConfig};
use openswag_core::{
    to_json, AppError, AppResult, Endpoint, GatewayAggregator, SpecAssembler, SpecSource,
};
use serde::Deserialize;
use serde_json::Value;

use crate::cache::FileCache;
use crate::output::emit;

/// Arguments for the export command.
#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    /// Endpoint manifest (JSON or YAML): a list of endpoints, or `{ endpoints: [...] }`.
    #[clap(long)]
    pub endpoints: PathBuf,

    /// Output file. Prints to stdout when omitted.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed.
    #[clap(long)]
    pub compact: bool,

    /// Fail when two endpoints share a method and path.
    #[clap(long)]
    pub strict: bool,

    /// Aggregate the configured gateway services into the document.
    #[clap(long)]
    pub gateway: bool,
}

#[derive(Deserialize)]
struct WrappedManifest {
    endpoints: Vec<Endpoint>,
}

/// `.json` is JSON, `.yaml`/`.yml` is YAML; otherwise a leading `{` or `[` means JSON.
fn is_json_manifest(path: &Path, content: &str) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => true,
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => false,
        _ => matches!(content.trim_start().chars().next(), Some('{' | '[')),
    }
}

/// Parses a manifest body: a bare endpoint list or `{ endpoints: [...] }`.
fn parse_manifest(content: &str, json: bool) -> AppResult<Vec<Endpoint>> {
    if json {
        if content.trim_start().starts_with('{') {
            let manifest: WrappedManifest = serde_json::from_str(content)?;
            return Ok(manifest.endpoints);
        }
        return Ok(serde_json::from_str(content)?);
    }

    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    if value.is_mapping() {
        let manifest: WrappedManifest = serde_yaml::from_value(value)?;
        Ok(manifest.endpoints)
    } else {
        Ok(serde_yaml::from_value(value)?)
    }
}

/// Reads an endpoint manifest.
pub fn read_manifest(path: &Path) -> AppResult<Vec<Endpoint>> {
    if !path.exists() {
        return Err(AppError::General(format!(
            "Endpoint manifest not found: {:?}",
            path
        )));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::General(format!("Failed to read manifest {:?}: {}", path, e)))?;
    parse_manifest(&content, is_json_manifest(path, &content))
}

/// Executes the export.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `config` - Loaded configuration (document metadata and gateway services).
pub fn execute(args: &ExportArgs, config: &OpenSwagConfig) -> AppResult<()> {
    let endpoints = read_manifest(&args.endpoints)?;
    tracing::info!(count = endpoints.len(), path = ?args.endpoints, "loaded endpoint manifest");

    let external = if args.gateway || config.gateway.enabled {
        gateway_document(&config.gateway)?
    } else {
        None
    };

    let document = build_document(config, &endpoints, external.as_ref(), args.strict)?;
    let json = to_json(&document, !args.compact)?;
    emit(args.output.as_deref(), &json)
}

fn build_document(
    config: &OpenSwagConfig,
    endpoints: &[Endpoint],
    external: Option<&Value>,
    strict: bool,
) -> AppResult<Value> {
    let assembler = SpecAssembler::new(config.document.clone());
    if strict {
        assembler.build_strict(endpoints, external)
    } else {
        Ok(assembler.build(endpoints, external))
    }
}

/// Aggregator over the configured services, backed by the on-disk cache in `gateway.cacheDir`.
#[cfg_attr(not(feature = "client"), allow(dead_code))]
fn gateway_aggregator<S: SpecSource>(config: &GatewayConfig, source: S) -> GatewayAggregator<S> {
    GatewayAggregator::from_config(config, source)
        .with_cache(Arc::new(FileCache::new(&config.cache_dir)))
}

#[cfg(feature = "client")]
fn gateway_document(config: &GatewayConfig) -> AppResult<Option<Value>> {
    use crate::http::UreqSource;

    if config.services.is_empty() {
        tracing::warn!("gateway aggregation requested but no services are configured");
        return Ok(None);
    }

    Ok(Some(gateway_aggregator(config, UreqSource).aggregated_spec()))
}

#[cfg(not(feature = "client"))]
fn gateway_document(_config: &GatewayConfig) -> AppResult<Option<Value>> {
    Err(AppError::General(
        "Gateway aggregation requires the `client` feature".into(),
    ))
}
