//! Packaged template resources used by `init`.
//!
//! Layout: `templates/<provider>/.env`, `templates/<provider>/docker-compose.yaml`,
//! `configs/` and `apps_data/`.

use crate::error::{Error, Result};
use crate::server::DatabaseProvider;
use crate::utils::{files, io};
use std::path::{Path, PathBuf};

pub const CONFIGS_DIR: &str = "configs";
pub const APPS_DATA_DIR: &str = "apps_data";
pub const ENV_FILE_NAME: &str = ".env";

pub fn env_template(provider: DatabaseProvider) -> String {
    format!("templates/{}/{}", provider.as_str(), ENV_FILE_NAME)
}

pub fn compose_template(provider: DatabaseProvider) -> String {
    format!(
        "templates/{}/{}",
        provider.as_str(),
        crate::paths::COMPOSE_FILE_NAME
    )
}

pub trait TemplateSource {
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Files below `dir`, as sorted paths relative to it.
    fn list(&self, dir: &str) -> Result<Vec<String>>;

    /// Where the templates come from, for logs and reports.
    fn origin(&self) -> String;
}

/// Templates compiled into the binary.
pub struct BuiltinTemplates;

macro_rules! resource {
    ($path:literal) => {
        (
            $path,
            include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/", $path)) as &[u8],
        )
    };
}

const BUILTIN: &[(&str, &[u8])] = &[
    resource!("templates/postgres/.env"),
    resource!("templates/postgres/docker-compose.yaml"),
    resource!("templates/mariadb/.env"),
    resource!("templates/mariadb/docker-compose.yaml"),
    resource!("templates/nodatabase/.env"),
    resource!("templates/nodatabase/docker-compose.yaml"),
    resource!("configs/nginx/app.conf"),
    resource!("configs/nginx/options-ssl.conf"),
    resource!("apps_data/README.md"),
];

impl TemplateSource for BuiltinTemplates {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        BUILTIN
            .iter()
            .find(|(name, _)| *name == path)
            .map(|(_, content)| content.to_vec())
            .ok_or_else(|| Error::template_not_found(path))
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let mut found: Vec<String> = BUILTIN
            .iter()
            .filter_map(|(name, _)| name.strip_prefix(&prefix))
            .map(str::to_string)
            .collect();
        if found.is_empty() {
            return Err(Error::template_not_found(dir));
        }
        found.sort();
        Ok(found)
    }

    fn origin(&self) -> String {
        "built-in".to_string()
    }
}

/// Templates read from a directory with the same layout as the built-in set.
pub struct DirTemplates {
    root: PathBuf,
}

impl DirTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateSource for DirTemplates {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(Error::template_not_found(full.display().to_string()));
        }
        io::read_bytes(&full, "read template")
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let base = self.root.join(dir);
        if !base.is_dir() {
            return Err(Error::template_not_found(base.display().to_string()));
        }
        let relative = files::walk_files(&base)?
            .iter()
            .filter_map(|file| files::remote_join("", &base, file))
            .map(|joined| joined.trim_start_matches('/').to_string())
            .collect();
        Ok(relative)
    }

    fn origin(&self) -> String {
        self.root.display().to_string()
    }
}

/// Copy every file below `dir` in `source` into `dest`, keeping the layout.
pub fn copy_tree(source: &dyn TemplateSource, dir: &str, dest: &Path) -> Result<usize> {
    let entries = source.list(dir)?;
    for relative in &entries {
        let content = source.read(&format!("{}/{}", dir.trim_end_matches('/'), relative))?;
        io::write_file(&dest.join(relative), &content, "copy template")?;
    }
    Ok(entries.len())
}
