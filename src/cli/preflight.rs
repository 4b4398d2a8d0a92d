//! Pre-flight checks before expensive operations.
//!
//! Validates configuration and the documents directory before any model is
//! contacted, so a bad setup fails in milliseconds rather than midway.

use crate::config::Settings;
use crate::error::{DocFinderError, Result};
use std::path::{Path, PathBuf};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Building an index and querying it needs the full pipeline configured.
    Pipeline,
    /// Listing models only talks to the completion service.
    Models,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Pipeline => settings.validate(),
        Operation::Models => {
            if settings.endpoint.models_url.trim().is_empty() {
                return Err(DocFinderError::Config(
                    "endpoint.models_url is blank".to_string(),
                ));
            }
            Ok(())
        }
    }
}

/// Resolve a documents directory argument and check it is a readable directory.
pub fn documents_dir(dir: &str) -> Result<PathBuf> {
    let path = Settings::expand_path(dir);
    check_directory(&path)?;
    Ok(path)
}

fn check_directory(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(DocFinderError::Processing(format!(
            "{} is not a directory",
            path.display()
        ))),
        Err(e) => Err(DocFinderError::Processing(format!(
            "Cannot access documents directory {}: {}",
            path.display(),
            e
        ))),
    }
}
