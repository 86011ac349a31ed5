#![deny(missing_docs)]

//! # Merge Command
//!
//! Merges local service documents into one gateway document, applying the path
//! prefixes registered in the gateway configuration.

use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use openswag_core::config::OpenSwagConfig;
use openswag_core::{read_document, to_json, AppError, AppResult, GatewayMerger};

use crate::error::{CliError, CliResult};
use crate::output::emit;

/// Arguments for the merge command.
#[derive(clap::Args, Debug, Clone)]
pub struct MergeArgs {
    /// Service document as `name=path`. Repeatable; merged in the order given.
    #[clap(long = "service", value_parser = parse_service, required = true)]
    pub services: Vec<(String, PathBuf)>,

    /// Output file. Prints to stdout when omitted.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed.
    #[clap(long)]
    pub compact: bool,
}

/// Parses `name=path`.
fn parse_service(s: &str) -> CliResult<(String, PathBuf)> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(CliError::InvalidService(s.to_string())),
    }
}

fn check_unique(services: &[(String, PathBuf)]) -> CliResult<()> {
    let mut seen = HashSet::new();
    for (name, _) in services {
        if !seen.insert(name.as_str()) {
            return Err(CliError::DuplicateService(name.clone()));
        }
    }
    Ok(())
}

/// Executes the merge.
pub fn execute(args: &MergeArgs, config: &OpenSwagConfig) -> AppResult<()> {
    check_unique(&args.services).map_err(|e| AppError::General(e.to_string()))?;

    let mut documents = IndexMap::new();
    for (name, path) in &args.services {
        documents.insert(name.clone(), read_document(path)?);
    }

    let merger = GatewayMerger::new(config.gateway.services.clone());
    for name in documents.keys() {
        if merger.find_service(name).is_none() {
            tracing::info!(service = %name, "service not in configuration, merging without prefix");
        }
    }

    let merged = merger.merge(&documents);
    tracing::info!(services = documents.len(), "merged service documents");
    emit(args.output.as_deref(), &to_json(&merged, !args.compact)?)
}
