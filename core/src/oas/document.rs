#![deny(missing_docs)]

//! # OpenAPI Documents
//!
//! Documents are handled as insertion-ordered `serde_json::Value` trees so that
//! externally produced content survives untouched. This module holds the few
//! structural conventions every consumer shares: which `paths[p]` keys are
//! operations, and how a document is written to the wire.

use crate::error::{AppError, AppResult};
use crate::oas::models::HttpMethod;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// The `openapi` version string emitted by the assembler and merger.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// A borrowed view of one operation found under `paths`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationRef<'a> {
    /// The path key, as written in the document.
    pub path: &'a str,
    /// The recognised HTTP method.
    pub method: HttpMethod,
    /// The Operation Object.
    pub operation: &'a Value,
}

/// Walks `paths` in document order and yields every operation.
///
/// Keys that are not HTTP methods (`parameters`, `summary`, `x-*`, ...) are skipped.
/// A document without `paths`, or with a non-object `paths`, has no operations.
pub fn operations(document: &Value) -> Vec<OperationRef<'_>> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (key, operation) in item {
            if let Some(method) = HttpMethod::from_key(key) {
                out.push(OperationRef {
                    path,
                    method,
                    operation,
                });
            }
        }
    }
    out
}

/// Reads `info.version`, defaulting to the empty string.
pub fn info_version(document: &Value) -> String {
    document
        .pointer("/info/version")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Serializes a document.
///
/// Forward slashes and non-ASCII characters are written unescaped; `pretty`
/// only controls indentation.
pub fn to_json(document: &Value, pretty: bool) -> AppResult<String> {
    let out = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    Ok(out)
}

/// Loads a JSON document from disk.
///
/// Each failure names the path and a single cause: the file is missing, it
/// cannot be read, or it is not a JSON object.
pub fn read_document(path: &Path) -> AppResult<Value> {
    if !path.exists() {
        return Err(AppError::SpecFileNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| AppError::SpecFileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value =
        serde_json::from_str(&content).map_err(|e| AppError::InvalidSpecJson {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !value.is_object() {
        return Err(AppError::InvalidSpecJson {
            path: path.to_path_buf(),
            reason: "document root is not an object".into(),
        });
    }

    Ok(value)
}
