//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

fn io_error(e: std::io::Error, operation: &str, path: &Path) -> Error {
    Error::internal_io(
        e.to_string(),
        Some(format!("{} ({})", operation, path.display())),
    )
}

/// Read raw file bytes with standardized error handling.
pub fn read_bytes(path: &Path, operation: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| io_error(e, operation, path))
}

/// Read file contents with standardized error handling.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| io_error(e, operation, path))
}

/// Write content to a file, creating missing parent directories first.
pub fn write_file(path: &Path, content: &[u8], operation: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent, operation)?;
    }
    fs::write(path, content).map_err(|e| io_error(e, operation, path))
}

/// Write content to file atomically (write to .tmp, then rename).
///
/// Readers see either the old content or the new content, never a partial write.
pub fn write_file_atomic(path: &Path, content: &[u8], operation: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content)
        .map_err(|e| io_error(e, &format!("{} (write temp)", operation), &tmp_path))?;

    fs::rename(&tmp_path, path)
        .map_err(|e| io_error(e, &format!("{} (rename)", operation), path))?;

    Ok(())
}

/// Copy a regular file, replacing any existing destination.
pub fn copy_file(src: &Path, dest: &Path, operation: &str) -> Result<()> {
    if !src.is_file() {
        return Err(Error::internal_io(
            format!("The path must point to a file! Current value: `{}`", src.display()),
            Some(operation.to_string()),
        ));
    }
    if let Some(parent) = dest.parent() {
        ensure_dir(parent, operation)?;
    }
    fs::copy(src, dest)
        .map(|_| ())
        .map_err(|e| io_error(e, operation, dest))
}

pub fn ensure_dir(path: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| io_error(e, operation, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "test content").unwrap();

        let content = read_file(temp.path(), "test read").unwrap();
        assert!(content.contains("test content"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let err = read_file(Path::new("/nonexistent/path.txt"), "test read").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn write_file_creates_missing_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/.env");

        write_file(&path, b"KEY=value", "test write").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "KEY=value");
    }

    #[test]
    fn write_file_atomic_leaves_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docker-compose.yaml");

        write_file_atomic(&path, b"services: {}", "test write").unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("docker-compose.yaml.tmp").exists());
    }

    #[test]
    fn copy_file_overwrites_existing_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("Dockerfile");
        let dest = dir.path().join("deploy/Dockerfile");
        fs::write(&src, "FROM new").unwrap();
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, "FROM old").unwrap();

        copy_file(&src, &dest, "test copy").unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "FROM new");
    }

    #[test]
    fn copy_file_rejects_directories() {
        let dir = TempDir::new().unwrap();
        let err = copy_file(dir.path(), &dir.path().join("x"), "test copy").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }
}
