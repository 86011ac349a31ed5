#![deny(missing_docs)]

//! # OpenSwag CLI
//!
//! Command Line Interface for assembling, merging and diffing OpenAPI documents.
//!
//! Supported Commands:
//! - `export`: Endpoint manifest + config -> OpenAPI document.
//! - `merge`: Service documents -> single gateway document.
//! - `diff`: Two document versions -> changelog and breaking changes.
//! - `cache`: Inspect or clear the persisted gateway service documents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use openswag_core::config::OpenSwagConfig;
use openswag_core::AppResult;
use tracing_subscriber::EnvFilter;

mod cache;
mod diff;
mod error;
mod export;
#[cfg(feature = "client")]
mod http;
mod merge;
mod output;

const DEFAULT_CONFIG: &str = "openswag.yaml";

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI document toolchain")]
struct Cli {
    /// Configuration file (YAML or JSON). Defaults to `openswag.yaml` when present.
    #[clap(long, global = true, env = "OPENSWAG_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build an OpenAPI document from an endpoint manifest.
    Export(export::ExportArgs),
    /// Merge service documents into a gateway document.
    Merge(merge::MergeArgs),
    /// Compare two OpenAPI documents.
    Diff(diff::DiffArgs),
    /// List or clear cached gateway service documents.
    Cache(cache::CacheArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// An explicitly named config must exist; the default one is optional.
fn load_config(path: Option<&Path>) -> AppResult<OpenSwagConfig> {
    let config = match path {
        Some(path) => OpenSwagConfig::load(path)?,
        None => OpenSwagConfig::load_or_default(Path::new(DEFAULT_CONFIG))?,
    };
    Ok(config.with_env_overrides())
}

fn run(cli: &Cli) -> AppResult<()> {
    match &cli.command {
        Commands::Export(args) => {
            let config = load_config(cli.config.as_deref())?;
            export::execute(args, &config)
        }
        Commands::Merge(args) => {
            let config = load_config(cli.config.as_deref())?;
            merge::execute(args, &config)
        }
        Commands::Diff(args) => diff::execute(args),
        Commands::Cache(args) => {
            let config = load_config(cli.config.as_deref())?;
            cache::execute(args, &config)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
