//! `${key}` values substituted into freshly scaffolded deployment files.

use crate::defaults::{DEFAULT_DB_PASSWORD, DEFAULT_DB_USER};
use crate::error::Result;
use crate::paths::ResolvedPaths;
use crate::server::ServerEntry;
use crate::utils::{files, io, template};
use std::collections::BTreeMap;
use std::path::Path;

pub const VAADIN_PROJECT_DIR: &str = "vaadinProjectDir";
pub const DEPLOYMENT_DIR: &str = "deploymentDir";
pub const APPS_DATA_DIR: &str = "appsDataDir";
pub const SERVER_DOMAIN: &str = "server.domain";
pub const DATABASE_USER_NAME: &str = "database.userName";
pub const DATABASE_PASSWORD: &str = "database.password";
pub const DATABASE_SCHEMA: &str = "database.schema";
pub const CERTBOT_EMAIL: &str = "certbot.email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMap {
    values: BTreeMap<String, String>,
}

impl PlaceholderMap {
    /// LOCAL servers run compose from the local staging folders, every other
    /// class from the remote ones.
    pub fn build(
        server: &ServerEntry,
        paths: &ResolvedPaths,
        artifact_id: &str,
        certbot_email: &str,
    ) -> Self {
        let (vaadin_dir, deployment_dir, apps_data_dir) = if server.environment_class.is_local() {
            (
                paths.vaadin_project_dir.display().to_string(),
                paths.local_deploy_dir.display().to_string(),
                paths.local_apps_data_dir.display().to_string(),
            )
        } else {
            (
                paths.remote_deploy_dir.clone(),
                paths.remote_deploy_dir.clone(),
                paths.remote_apps_data_dir.clone(),
            )
        };

        let values = [
            (VAADIN_PROJECT_DIR, vaadin_dir),
            (DEPLOYMENT_DIR, deployment_dir),
            (APPS_DATA_DIR, apps_data_dir),
            (SERVER_DOMAIN, server.domain.clone()),
            (DATABASE_USER_NAME, DEFAULT_DB_USER.to_string()),
            (DATABASE_PASSWORD, DEFAULT_DB_PASSWORD.to_string()),
            (DATABASE_SCHEMA, artifact_id.to_string()),
            (CERTBOT_EMAIL, certbot_email.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn apply(&self, text: &str) -> String {
        template::render_map(text, &self.values)
    }

    /// Rewrite every text file under `root` in place. Files that are not
    /// UTF-8 are left alone. Returns how many files changed.
    pub fn substitute_tree(&self, root: &Path) -> Result<usize> {
        let mut changed = 0;
        for file in files::walk_files(root)? {
            let bytes = io::read_bytes(&file, "read for substitution")?;
            let Ok(text) = String::from_utf8(bytes) else {
                tracing::debug!(path = %file.display(), "Skipping non-UTF-8 file");
                continue;
            };
            let rendered = self.apply(&text);
            if rendered != text {
                io::write_file_atomic(&file, rendered.as_bytes(), "substitute placeholders")?;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::EnvironmentClass;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn entry(class: EnvironmentClass) -> ServerEntry {
        ServerEntry {
            environment_class: class,
            domain: "app.example.com".to_string(),
            database_provider: None,
            deploy_dir: "/opt/app".to_string(),
            apps_data_dir: "/opt/data".to_string(),
            backup_dir: None,
            ssh_connection: None,
        }
    }

    fn paths() -> ResolvedPaths {
        ResolvedPaths::resolve_at(
            &entry(EnvironmentClass::Test),
            Path::new("/work"),
            Path::new("/work/app"),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn remote_servers_use_remote_dirs() {
        let map = PlaceholderMap::build(&entry(EnvironmentClass::Prod), &paths(), "shop", "a@b.io");
        assert_eq!(map.get(VAADIN_PROJECT_DIR), Some("/opt/app"));
        assert_eq!(map.get(DEPLOYMENT_DIR), Some("/opt/app"));
        assert_eq!(map.get(APPS_DATA_DIR), Some("/opt/data"));
        assert_eq!(map.get(DATABASE_SCHEMA), Some("shop"));
        assert_eq!(map.get(DATABASE_USER_NAME), Some("user"));
        assert_eq!(map.get(DATABASE_PASSWORD), Some("P@ssword#5202"));
        assert_eq!(map.get(CERTBOT_EMAIL), Some("a@b.io"));
    }

    #[test]
    fn local_servers_use_local_dirs() {
        let map = PlaceholderMap::build(&entry(EnvironmentClass::Local), &paths(), "shop", "a@b.io");
        assert_eq!(map.get(VAADIN_PROJECT_DIR), Some("/work/app"));
        assert_eq!(
            map.get(DEPLOYMENT_DIR).map(PathBuf::from),
            Some(PathBuf::from("/work/_deployment/app.example.com/opt/app"))
        );
    }

    #[test]
    fn substitute_tree_rewrites_text_and_skips_binary() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("configs")).unwrap();
        fs::write(dir.path().join(".env"), "DOMAIN=${server.domain}\nKEEP=${OTHER}\n").unwrap();
        fs::write(dir.path().join("configs/static.conf"), "nothing here").unwrap();
        fs::write(dir.path().join("logo.png"), [0xff, 0xfe, b'$', b'{']).unwrap();

        let map = PlaceholderMap::build(&entry(EnvironmentClass::Test), &paths(), "shop", "a@b.io");
        let changed = map.substitute_tree(dir.path()).unwrap();

        assert_eq!(changed, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join(".env")).unwrap(),
            "DOMAIN=app.example.com\nKEEP=${OTHER}\n"
        );
        assert_eq!(fs::read(dir.path().join("logo.png")).unwrap(), vec![0xff, 0xfe, b'$', b'{']);
    }
}
