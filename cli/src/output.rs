#![deny(missing_docs)]

//! # Output
//!
//! Writes generated documents to a file or stdout.

use std::fs;
use std::path::Path;

use openswag_core::{AppError, AppResult};

/// Writes `content` to `path`, creating parent directories, or prints it when no path is given.
pub fn emit(path: Option<&Path>, content: &str) -> AppResult<()> {
    let Some(path) = path else {
        println!("{}", content);
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::General(format!("Failed to create output dir: {}", e)))?;
    }

    fs::write(path, content)
        .map_err(|e| AppError::General(format!("Failed to write {:?}: {}", path, e)))?;

    tracing::info!(?path, bytes = content.len(), "wrote document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_emit_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/deeper/openapi.json");

        emit(Some(target.as_path()), "{}").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
    }

    #[test]
    fn test_emit_writes_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.json");
        emit(Some(target.as_path()), "[]").unwrap();
        assert!(target.exists());
    }
}
