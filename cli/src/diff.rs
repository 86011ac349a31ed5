#![deny(missing_docs)]

//! # Diff Command
//!
//! Compares two OpenAPI JSON files and reports breaking changes.

use std::path::PathBuf;

use openswag_core::{compare_files, AppResult, DiffResult};

/// Report format.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiffFormat {
    /// Summary counts, then breaking changes and the migration guide.
    #[default]
    Text,
    /// The full diff result as JSON.
    Json,
    /// Markdown changelog.
    Markdown,
}

/// Arguments for the diff command.
#[derive(clap::Args, Debug, Clone)]
pub struct DiffArgs {
    /// The older document.
    pub old: PathBuf,

    /// The newer document.
    pub new: PathBuf,

    /// Report format.
    #[clap(long, value_enum, default_value_t = DiffFormat::Text)]
    pub format: DiffFormat,
}

/// Renders a diff result in the requested format.
pub fn render(result: &DiffResult, format: DiffFormat) -> AppResult<String> {
    Ok(match format {
        DiffFormat::Text => result.to_text_report(),
        DiffFormat::Json => result.to_json(true)?,
        DiffFormat::Markdown => result.to_markdown(),
    })
}

/// Executes the diff.
pub fn execute(args: &DiffArgs) -> AppResult<()> {
    let result = compare_files(&args.old, &args.new)?;
    if result.has_breaking_changes() {
        tracing::warn!(
            count = result.summary.breaking_changes,
            "breaking changes detected"
        );
    }
    println!("{}", render(&result, args.format)?);
    Ok(())
}
