//! Local and remote directory layout for one server.
//!
//! Everything here is derived from the server entry plus the project and
//! Vaadin directories; nothing touches the remote host.

use crate::server::ServerEntry;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEPLOYMENT_DIR_NAME: &str = "_deployment";
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yaml";
pub const TARGET_DIR_NAME: &str = "target";
pub const DOCKERFILE_NAME: &str = "Dockerfile";
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Trim, strip every leading and trailing `/`, then prefix a single `/`.
///
/// `"hello/world/"`, `"/hello/world"` and `" /hello/world/ "` all become
/// `"/hello/world"`; applying it twice changes nothing.
pub fn normalize_dir(raw: &str) -> String {
    format!("/{}", raw.trim().trim_matches('/'))
}

/// `<projectBase>/_deployment/<domain>`
pub fn local_root(project_base: &Path, domain: &str) -> PathBuf {
    project_base.join(DEPLOYMENT_DIR_NAME).join(domain)
}

fn under(root: &Path, remote_dir: &str) -> PathBuf {
    let relative = remote_dir.trim_start_matches('/');
    if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPaths {
    pub vaadin_project_dir: PathBuf,
    pub local_root: PathBuf,
    pub local_deploy_dir: PathBuf,
    pub local_apps_data_dir: PathBuf,
    pub local_target_dir: PathBuf,
    pub remote_deploy_dir: String,
    pub remote_apps_data_dir: String,
    pub remote_compose_file: String,
    pub remote_target_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_backup_dir: Option<String>,
}

impl ResolvedPaths {
    /// Resolve using the current local time for the backup timestamp.
    pub fn resolve(server: &ServerEntry, project_base: &Path, vaadin_project_dir: &Path) -> Self {
        Self::resolve_at(
            server,
            project_base,
            vaadin_project_dir,
            chrono::Local::now().naive_local(),
        )
    }

    /// Resolve with an explicit clock reading. The timestamp is captured here
    /// once, so every step of a run sees the same backup path.
    pub fn resolve_at(
        server: &ServerEntry,
        project_base: &Path,
        vaadin_project_dir: &Path,
        now: NaiveDateTime,
    ) -> Self {
        let local_root = local_root(project_base, &server.domain);
        let remote_deploy_dir = server.deploy_dir.clone();
        let remote_backup_dir = server.backup_dir.as_ref().map(|dir| {
            format!(
                "{}/{}",
                dir.trim_end_matches('/'),
                now.format(BACKUP_TIMESTAMP_FORMAT)
            )
        });

        Self {
            vaadin_project_dir: vaadin_project_dir.to_path_buf(),
            local_deploy_dir: under(&local_root, &server.deploy_dir),
            local_apps_data_dir: under(&local_root, &server.apps_data_dir),
            local_target_dir: vaadin_project_dir.join(TARGET_DIR_NAME),
            local_root,
            remote_compose_file: remote_child(&remote_deploy_dir, COMPOSE_FILE_NAME),
            remote_target_dir: remote_child(&remote_deploy_dir, TARGET_DIR_NAME),
            remote_apps_data_dir: server.apps_data_dir.clone(),
            remote_deploy_dir,
            remote_backup_dir,
        }
    }

    /// True iff the server's local staging root already exists.
    pub fn already_initialized(&self) -> bool {
        self.local_root.exists()
    }

    pub fn vaadin_dockerfile(&self) -> PathBuf {
        self.vaadin_project_dir.join(DOCKERFILE_NAME)
    }
}

fn remote_child(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}
