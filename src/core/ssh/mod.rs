//! Remote host capability used by the deploy steps.

mod client;

pub use client::{CommandOutput, SshOptions, SshSession, SshSessionFactory};

use crate::error::{Error, Result};
use crate::server::SshConnection;
use crate::utils::files;
use std::path::Path;

/// One authenticated connection to a host.
///
/// Implementations release the connection when dropped.
pub trait RemoteSession {
    /// Run a shell command; a non-zero exit status is `remote.command_failed`
    /// carrying the combined output and exit code.
    fn execute(&self, command: &str) -> Result<String>;

    /// True if anything exists at the path, false only when nothing does.
    fn exists(&self, remote_path: &str) -> Result<bool>;

    /// True if the directory has no entries or does not exist at all.
    fn is_empty(&self, remote_dir: &str) -> Result<bool>;

    /// Create the directory and every missing ancestor.
    fn ensure_dir(&self, remote_dir: &str) -> Result<()>;

    /// Ensure `remote_dir` exists, then copy the file into it, overwriting.
    fn upload_file(&self, local_file: &Path, remote_dir: &str) -> Result<()>;

    fn is_session_valid(&self) -> bool;

    /// Upload every regular file under `local_dir`, keeping its relative
    /// location under `remote_dir`. Returns the number of files sent.
    fn upload_tree(&self, local_dir: &Path, remote_dir: &str) -> Result<usize> {
        let local_files = files::walk_files(local_dir)?;
        for file in &local_files {
            let remote_path = files::remote_join(remote_dir, local_dir, file).ok_or_else(|| {
                Error::internal_unexpected(format!(
                    "{} is not under {}",
                    file.display(),
                    local_dir.display()
                ))
            })?;
            self.upload_file(file, files::remote_parent(&remote_path))?;
        }
        Ok(local_files.len())
    }
}

/// Opens sessions for the orchestrator, one per server.
pub trait SessionFactory {
    fn open(&self, connection: &SshConnection) -> Result<Box<dyn RemoteSession>>;
}
