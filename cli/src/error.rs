#![deny(missing_docs)]

//! # CLI Errors
//!
//! Argument-level error types for the CLI crate.

use derive_more::Display;

/// Errors raised while interpreting command-line arguments.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum CliError {
    /// A `--service` value that is not `name=path`.
    #[display("invalid service `{}`: expected NAME=PATH", _0)]
    InvalidService(String),

    /// The same service name given twice.
    #[display("Duplicate service name: {}", _0)]
    DuplicateService(String),
}

/// Manual implementation of the standard Error trait.
///
/// `derive(Error)` would try to treat the `String` payloads as sources.
impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
