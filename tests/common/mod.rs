#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::json;
use tempfile::TempDir;
use vaadin_deploy::config::DeployConfig;
use vaadin_deploy::error::{RemoteCommandFailedDetails, TargetDetails};
use vaadin_deploy::server::SshConnection;
use vaadin_deploy::ssh::{RemoteSession, SessionFactory};
use vaadin_deploy::{Error, Result};

/// Remote host state shared between the factory and every session it opens.
#[derive(Debug, Default)]
pub struct RemoteState {
    pub log: Vec<String>,
    pub existing: HashSet<String>,
    pub non_empty: HashSet<String>,
    /// Output of `docker compose version`; `None` makes the command fail.
    pub compose_version: Option<String>,
    pub invalid_session: bool,
}

#[derive(Clone)]
pub struct MockRemote {
    pub state: Rc<RefCell<RemoteState>>,
}

impl MockRemote {
    pub fn new() -> Self {
        let state = RemoteState {
            compose_version: Some("Docker Compose version v2.20.2\n".to_string()),
            ..RemoteState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn with_existing(self, paths: &[&str]) -> Self {
        self.state
            .borrow_mut()
            .existing
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    pub fn with_non_empty(self, dir: &str) -> Self {
        self.state.borrow_mut().non_empty.insert(dir.to_string());
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    /// Log entries that touched the remote host, excluding session open/close.
    pub fn remote_calls(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter(|entry| !entry.starts_with("open ") && entry != "close")
            .collect()
    }
}

pub struct MockSession {
    state: Rc<RefCell<RemoteState>>,
}

impl MockSession {
    fn record(&self, entry: String) {
        self.state.borrow_mut().log.push(entry);
    }
}

impl RemoteSession for MockSession {
    fn execute(&self, command: &str) -> Result<String> {
        self.record(format!("exec {}", command));
        if command == "docker compose version" {
            let output = self.state.borrow().compose_version.clone();
            return output.ok_or_else(|| {
                Error::remote_command_failed(RemoteCommandFailedDetails {
                    command: command.to_string(),
                    exit_code: 127,
                    output: "docker: command not found".to_string(),
                    target: TargetDetails::default(),
                })
            });
        }
        Ok(String::new())
    }

    fn exists(&self, remote_path: &str) -> Result<bool> {
        self.record(format!("exists {}", remote_path));
        Ok(self.state.borrow().existing.contains(remote_path))
    }

    fn is_empty(&self, remote_dir: &str) -> Result<bool> {
        self.record(format!("is_empty {}", remote_dir));
        Ok(!self.state.borrow().non_empty.contains(remote_dir))
    }

    fn ensure_dir(&self, remote_dir: &str) -> Result<()> {
        self.record(format!("mkdir {}", remote_dir));
        self.state
            .borrow_mut()
            .existing
            .insert(remote_dir.to_string());
        Ok(())
    }

    fn upload_file(&self, local_file: &Path, remote_dir: &str) -> Result<()> {
        let name = local_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let remote_path = format!("{}/{}", remote_dir.trim_end_matches('/'), name);
        self.record(format!("upload {}", remote_path));
        let mut state = self.state.borrow_mut();
        state.existing.insert(remote_dir.to_string());
        state.existing.insert(remote_path);
        Ok(())
    }

    fn is_session_valid(&self) -> bool {
        !self.state.borrow().invalid_session
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.record("close".to_string());
    }
}

impl SessionFactory for MockRemote {
    fn open(&self, connection: &SshConnection) -> Result<Box<dyn RemoteSession>> {
        self.state
            .borrow_mut()
            .log
            .push(format!("open {}", connection.target()));
        Ok(Box::new(MockSession {
            state: Rc::clone(&self.state),
        }))
    }
}

/// A Vaadin project with a Dockerfile and one built jar.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let vaadin = dir.path().join("vaadin");
        fs::create_dir_all(vaadin.join("target")).unwrap();
        fs::write(vaadin.join("Dockerfile"), "FROM eclipse-temurin:17-jre\n").unwrap();
        fs::write(vaadin.join("target/app-1.0.jar"), b"PK").unwrap();
        Self { dir }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn vaadin(&self) -> PathBuf {
        self.dir.path().join("vaadin")
    }

    pub fn config(&self, servers: serde_json::Value) -> DeployConfig {
        let raw = json!({
            "projectBaseDir": self.base(),
            "vaadinProjectDir": self.vaadin(),
            "artifactId": "shop",
            "certbotEmail": "ops@example.com",
            "settings": { "settleDelaySecs": 0, "settleAttempts": 1 },
            "servers": servers,
        });
        DeployConfig::from_json(&raw.to_string(), "test").unwrap()
    }
}

pub fn server(class: &str, domain: &str) -> serde_json::Value {
    json!({
        "type": class,
        "domain": domain,
        "dbProvider": "postgres",
        "deployDir": "/opt/app",
        "appsDataDir": "/opt/data",
        "sshConnection": { "host": "10.0.0.5", "user": "deploy", "password": "secret" }
    })
}
