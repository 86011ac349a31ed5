//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};
use std::path::PathBuf;

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Wrapper for YAML (de)serialization errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// A document file handed to the differ does not exist.
    #[from(ignore)]
    #[display("Spec file not found: {}", _0.display())]
    SpecFileNotFound(PathBuf),

    /// A document file exists but could not be read.
    #[from(ignore)]
    #[display("Unable to read spec file {}: {source}", path.display())]
    SpecFileUnreadable {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO failure.
        source: std::io::Error,
    },

    /// A document file is not valid JSON, or is JSON but not an object.
    #[from(ignore)]
    #[display("Invalid JSON in spec file {}: {reason}", path.display())]
    InvalidSpecJson {
        /// Path of the offending file.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// Strict assembly found operations registered more than once.
    #[from(ignore)]
    #[display("Duplicate operations registered: {}", _0.join(", "))]
    DuplicateOperations(Vec<String>),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            AppError::Json(e) => Some(e),
            AppError::Yaml(e) => Some(e),
            AppError::SpecFileUnreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
