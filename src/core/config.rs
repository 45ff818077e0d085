//! Deployment configuration file (`deploy.json`).

use crate::defaults::{self, Settings};
use crate::error::{Error, Result};
use crate::server::ServerConfig;
use crate::utils::{io, validation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    #[serde(default = "default_dir")]
    pub project_base_dir: PathBuf,

    #[serde(default = "default_dir")]
    pub vaadin_project_dir: PathBuf,

    /// Extension of the built package in `<vaadinProjectDir>/target`.
    #[serde(default = "defaults::packaging")]
    pub packaging: String,

    #[serde(default)]
    pub artifact_id: Option<String>,

    #[serde(default)]
    pub certbot_email: Option<String>,

    #[serde(default)]
    pub templates_dir: Option<PathBuf>,

    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

impl DeployConfig {
    pub fn from_json(content: &str, origin: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::config_invalid_json(origin, e))
    }

    /// Anchor relative directories at `base`.
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        let anchor = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                base.join(path)
            }
        };
        self.project_base_dir = anchor(self.project_base_dir);
        self.vaadin_project_dir = anchor(self.vaadin_project_dir);
        self.templates_dir = self.templates_dir.map(anchor);
        self
    }

    pub fn packaging(&self) -> &str {
        self.packaging.trim().trim_start_matches('.')
    }

    pub fn require_artifact_id(&self) -> Result<&str> {
        validation::require_non_blank(self.artifact_id.as_deref(), "artifactId").map_err(|e| {
            e.with_hint("Set 'artifactId' in the config; it names the database schema")
        })
    }
}

/// Load the config at `path`. Relative directories inside it resolve against
/// the file's own directory.
pub fn load(path: &Path) -> Result<DeployConfig> {
    if !path.is_file() {
        return Err(Error::config_not_found(path.display().to_string()));
    }

    let content = io::read_file(path, "read config")?;
    let config = DeployConfig::from_json(&content, &path.display().to_string())?;

    let base = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()
            .map_err(|e| Error::internal_io(e.to_string(), Some("resolve current dir".into())))?,
    };

    tracing::debug!(path = %path.display(), servers = config.servers.len(), "Loaded config");
    Ok(config.resolve_relative_to(&base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = DeployConfig::from_json("{}", "inline").unwrap();
        assert_eq!(config.project_base_dir, PathBuf::from("."));
        assert_eq!(config.packaging(), "jar");
        assert!(config.servers.is_empty());
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn invalid_json_is_reported_with_origin() {
        let err = DeployConfig::from_json("{ nope", "deploy.json").unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
        assert_eq!(err.details["path"], "deploy.json");
    }

    #[test]
    fn load_resolves_relative_dirs_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deploy.json");
        fs::write(
            &path,
            r#"{ "vaadinProjectDir": "app", "templatesDir": "/abs/templates", "packaging": ".war" }"#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.project_base_dir, dir.path().join("."));
        assert_eq!(config.vaadin_project_dir, dir.path().join("app"));
        assert_eq!(config.templates_dir, Some(PathBuf::from("/abs/templates")));
        assert_eq!(config.packaging(), "war");
    }

    #[test]
    fn missing_file_is_config_not_found() {
        let err = load(Path::new("/nonexistent/deploy.json")).unwrap_err();
        assert_eq!(err.code.as_str(), "config.not_found");
    }

    #[test]
    fn artifact_id_is_required_when_asked_for() {
        let config = DeployConfig::from_json(r#"{ "artifactId": "  " }"#, "inline").unwrap();
        assert_eq!(
            config.require_artifact_id().unwrap_err().code.as_str(),
            "config.missing_key"
        );
    }
}
