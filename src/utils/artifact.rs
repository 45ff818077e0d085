//! Build artifact lookup by packaging extension.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// List regular files directly inside `dir` whose name ends with `.<extension>`.
pub fn find_by_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(extension)
    );

    let mut entries: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| {
            Error::validation_invalid_argument(
                "packaging",
                format!("Invalid artifact pattern '{}': {}", pattern, e),
                Some(extension.to_string()),
                None,
            )
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    entries.sort();
    Ok(entries)
}

/// Resolve the single built artifact inside `dir`.
///
/// A missing directory, no match, and more than one match are all errors.
pub fn resolve_single(dir: &Path, extension: &str) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(Error::artifact_dir_missing(dir.display().to_string()));
    }

    let mut found = find_by_extension(dir, extension)?;
    match found.len() {
        0 => Err(Error::artifact_missing(dir.display().to_string(), extension)),
        1 => Ok(found.remove(0)),
        _ => Err(Error::artifact_ambiguous(
            dir.display().to_string(),
            extension,
            found
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        )),
    }
}
