//! Recursive regular-file walking.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Collect every regular file under `root`, sorted by path.
///
/// Directories only contribute the files they contain, so an empty
/// directory produces nothing. Symlinks are not followed.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_recursive(root, &mut files).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("walk {}", root.display())))
    })?;
    files.sort();
    Ok(files)
}

fn walk_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            walk_recursive(&path, files)?;
        } else if file_type.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

/// Join the path of `file` relative to `base` onto `remote_dir` with forward slashes.
pub fn remote_join(remote_dir: &str, base: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(base).ok()?;
    let mut joined = remote_dir.trim_end_matches('/').to_string();
    for component in relative.components() {
        joined.push('/');
        joined.push_str(&component.as_os_str().to_string_lossy());
    }
    Some(joined)
}

/// Parent directory of a remote (forward-slash) path.
pub fn remote_parent(remote_path: &str) -> &str {
    match remote_path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &remote_path[..idx],
        None => ".",
    }
}
