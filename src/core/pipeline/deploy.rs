use super::{check_dockerfile, Step, StepOutcome};
use crate::error::{Error, ErrorCode, Result};
use crate::paths::ResolvedPaths;
use crate::ssh::RemoteSession;
use crate::utils::{artifact, parser, shell};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

pub const COMPOSE_VERSION_COMMAND: &str = "docker compose version";

pub fn compose_down_command(compose_file: &str) -> String {
    format!("docker compose -f {} down -v", shell::quote_path(compose_file))
}

pub fn compose_up_command(compose_file: &str) -> String {
    format!("docker compose -f {} up -d --build", shell::quote_path(compose_file))
}

pub fn backup_command(deploy_dir: &str, backup_dir: &str) -> String {
    format!(
        "cp -r {} {}",
        shell::quote_path(deploy_dir),
        shell::quote_path(backup_dir)
    )
}

/// How long Start waits for the uploaded compose file to show up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settle {
    pub delay: Duration,
    pub attempts: u32,
}

pub struct DeployContext<'a> {
    pub session: &'a dyn RemoteSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployStep {
    CheckDockerfile {
        dir: PathBuf,
    },
    CheckArtifact {
        target_dir: PathBuf,
        extension: String,
    },
    CheckCompose,
    Stop {
        compose_file: String,
    },
    Backup {
        deploy_dir: String,
        backup_dir: Option<String>,
    },
    UploadDeployment {
        local_dir: PathBuf,
        remote_dir: String,
    },
    UploadAppsData {
        local_dir: PathBuf,
        remote_dir: String,
    },
    UploadArtifact {
        target_dir: PathBuf,
        extension: String,
        remote_dir: String,
    },
    Start {
        compose_file: String,
        settle: Settle,
    },
}

/// The nine deploy steps in their fixed order.
pub fn deploy_pipeline(paths: &ResolvedPaths, packaging: &str, settle: Settle) -> Vec<DeployStep> {
    vec![
        DeployStep::CheckDockerfile {
            dir: paths.vaadin_project_dir.clone(),
        },
        DeployStep::CheckArtifact {
            target_dir: paths.local_target_dir.clone(),
            extension: packaging.to_string(),
        },
        DeployStep::CheckCompose,
        DeployStep::Stop {
            compose_file: paths.remote_compose_file.clone(),
        },
        DeployStep::Backup {
            deploy_dir: paths.remote_deploy_dir.clone(),
            backup_dir: paths.remote_backup_dir.clone(),
        },
        DeployStep::UploadDeployment {
            local_dir: paths.local_deploy_dir.clone(),
            remote_dir: paths.remote_deploy_dir.clone(),
        },
        DeployStep::UploadAppsData {
            local_dir: paths.local_apps_data_dir.clone(),
            remote_dir: paths.remote_apps_data_dir.clone(),
        },
        DeployStep::UploadArtifact {
            target_dir: paths.local_target_dir.clone(),
            extension: packaging.to_string(),
            remote_dir: paths.remote_target_dir.clone(),
        },
        DeployStep::Start {
            compose_file: paths.remote_compose_file.clone(),
            settle,
        },
    ]
}

impl DeployStep {
    pub fn id(&self) -> &'static str {
        match self {
            DeployStep::CheckDockerfile { .. } => "check_dockerfile",
            DeployStep::CheckArtifact { .. } => "check_artifact",
            DeployStep::CheckCompose => "check_compose",
            DeployStep::Stop { .. } => "stop",
            DeployStep::Backup { .. } => "backup",
            DeployStep::UploadDeployment { .. } => "upload_deployment",
            DeployStep::UploadAppsData { .. } => "upload_apps_data",
            DeployStep::UploadArtifact { .. } => "upload_artifact",
            DeployStep::Start { .. } => "start",
        }
    }
}

impl<'a> Step<DeployContext<'a>> for DeployStep {
    fn id(&self) -> &'static str {
        DeployStep::id(self)
    }

    fn describe(&self, _ctx: &DeployContext<'a>) -> String {
        match self {
            DeployStep::CheckDockerfile { dir } => {
                format!("Check the Dockerfile exists in `{}`...", dir.display())
            }
            DeployStep::CheckArtifact { target_dir, .. } => format!(
                "Check the Vaadin project has been built: `{}`...",
                target_dir.display()
            ),
            DeployStep::CheckCompose => {
                "Check whether docker compose is installed on the server...".to_string()
            }
            DeployStep::Stop { compose_file } => {
                format!("Stop DockerCompose: `{}`...", compose_file)
            }
            DeployStep::Backup {
                deploy_dir,
                backup_dir,
            } => format!(
                "Backup dir on server from `{}` to `{}`",
                deploy_dir,
                backup_dir.as_deref().unwrap_or("-")
            ),
            DeployStep::UploadDeployment {
                local_dir,
                remote_dir,
            } => format!(
                "Copy the deployment settings `{}` to the server `{}`...",
                local_dir.display(),
                remote_dir
            ),
            DeployStep::UploadAppsData {
                local_dir,
                remote_dir,
            } => format!(
                "Copy Apps Data dir from `{}` to `{}`...",
                local_dir.display(),
                remote_dir
            ),
            DeployStep::UploadArtifact {
                target_dir,
                extension,
                remote_dir,
            } => format!(
                "Copy the compiled package (`*.{}`) from `{}` to `{}`...",
                extension,
                target_dir.display(),
                remote_dir
            ),
            DeployStep::Start { compose_file, .. } => {
                format!("Start DockerCompose: `{}`...", compose_file)
            }
        }
    }

    fn run(&self, ctx: &DeployContext<'a>) -> Result<StepOutcome> {
        let session = ctx.session;
        match self {
            DeployStep::CheckDockerfile { dir } => check_dockerfile(dir),

            DeployStep::CheckArtifact {
                target_dir,
                extension,
            } => {
                let artifact = artifact::resolve_single(target_dir, extension)?;
                Ok(StepOutcome::detail(artifact.display().to_string()))
            }

            DeployStep::CheckCompose => {
                let output = session.execute(COMPOSE_VERSION_COMMAND).map_err(|err| {
                    match err.code {
                        ErrorCode::RemoteCommandFailed => Error::compose_unavailable(
                            err.details["output"].as_str().unwrap_or_default(),
                        ),
                        _ => err,
                    }
                })?;
                match parser::parse_compose_version(&output) {
                    Some(version) => Ok(StepOutcome::detail(format!("Docker Compose v{}", version))),
                    None => Err(Error::compose_unavailable(output)),
                }
            }

            DeployStep::Stop { compose_file } => {
                if !session.exists(compose_file)? {
                    return Ok(StepOutcome::detail(format!(
                        "`{}` not found, nothing to stop",
                        compose_file
                    )));
                }
                session.execute(&compose_down_command(compose_file))?;
                Ok(StepOutcome::done())
            }

            DeployStep::Backup {
                deploy_dir,
                backup_dir,
            } => {
                let Some(backup_dir) = backup_dir else {
                    return Ok(StepOutcome::skipped(
                        "Backup is skipped: 'server.backupDir' is not configured",
                    ));
                };
                if !session.exists(deploy_dir)? {
                    return Ok(StepOutcome::skipped(format!(
                        "Backup is skipped: `{}` doesn't exist on the server yet",
                        deploy_dir
                    )));
                }
                session.ensure_dir(backup_dir)?;
                session.execute(&backup_command(deploy_dir, backup_dir))?;
                Ok(StepOutcome::detail(backup_dir.clone()))
            }

            DeployStep::UploadDeployment {
                local_dir,
                remote_dir,
            } => {
                if !local_dir.is_dir() {
                    return Err(Error::deployment_missing(local_dir.display().to_string()));
                }
                let count = session.upload_tree(local_dir, remote_dir)?;
                Ok(StepOutcome::detail(format!("{} files uploaded", count)))
            }

            DeployStep::UploadAppsData {
                local_dir,
                remote_dir,
            } => {
                if !session.is_empty(remote_dir)? {
                    return Ok(StepOutcome::skipped(format!(
                        "`{}` is not empty on the server; existing application data is kept",
                        remote_dir
                    )));
                }
                if !local_dir.is_dir() {
                    return Ok(StepOutcome::skipped(format!(
                        "`{}` doesn't exist locally; nothing to copy",
                        local_dir.display()
                    )));
                }
                let count = session.upload_tree(local_dir, remote_dir)?;
                Ok(StepOutcome::detail(format!("{} files uploaded", count)))
            }

            DeployStep::UploadArtifact {
                target_dir,
                extension,
                remote_dir,
            } => {
                let artifacts = artifact::find_by_extension(target_dir, extension)?;
                for file in &artifacts {
                    session.upload_file(file, remote_dir)?;
                }
                Ok(StepOutcome::detail(format!("{} files uploaded", artifacts.len())))
            }

            DeployStep::Start {
                compose_file,
                settle,
            } => {
                let attempts = settle.attempts.max(1);
                for attempt in 1..=attempts {
                    if !settle.delay.is_zero() {
                        thread::sleep(settle.delay);
                    }
                    if session.exists(compose_file)? {
                        session.execute(&compose_up_command(compose_file))?;
                        return Ok(StepOutcome::done());
                    }
                    tracing::debug!(attempt, attempts, compose_file = %compose_file, "Compose file not visible yet");
                }
                Err(Error::compose_file_missing(compose_file.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::path::Path;

    #[derive(Default)]
    struct RecordingSession {
        existing: HashSet<String>,
        log: RefCell<Vec<String>>,
    }

    impl RecordingSession {
        fn record(&self, entry: String) {
            self.log.borrow_mut().push(entry);
        }

        fn log(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    impl RemoteSession for RecordingSession {
        fn execute(&self, command: &str) -> Result<String> {
            self.record(format!("exec {}", command));
            Ok(String::new())
        }

        fn exists(&self, remote_path: &str) -> Result<bool> {
            self.record(format!("exists {}", remote_path));
            Ok(self.existing.contains(remote_path))
        }

        fn is_empty(&self, remote_dir: &str) -> Result<bool> {
            self.record(format!("is_empty {}", remote_dir));
            Ok(true)
        }

        fn ensure_dir(&self, remote_dir: &str) -> Result<()> {
            self.record(format!("mkdir {}", remote_dir));
            Ok(())
        }

        fn upload_file(&self, _local_file: &Path, remote_dir: &str) -> Result<()> {
            self.record(format!("upload {}", remote_dir));
            Ok(())
        }

        fn is_session_valid(&self) -> bool {
            true
        }
    }

    #[test]
    fn backup_skips_when_deploy_dir_is_absent() {
        let session = RecordingSession::default();
        let step = DeployStep::Backup {
            deploy_dir: "/opt/app".to_string(),
            backup_dir: Some("/opt/backup/2024-01-01_00-00-00".to_string()),
        };

        let outcome = step.run(&DeployContext { session: &session }).unwrap();

        assert!(matches!(outcome, StepOutcome::Skipped { .. }));
        assert_eq!(session.log(), vec!["exists /opt/app".to_string()]);
    }

    #[test]
    fn backup_copies_an_existing_deploy_dir() {
        let session = RecordingSession {
            existing: HashSet::from(["/opt/app".to_string()]),
            ..Default::default()
        };
        let step = DeployStep::Backup {
            deploy_dir: "/opt/app".to_string(),
            backup_dir: Some("/opt/backup/2024-01-01_00-00-00".to_string()),
        };

        step.run(&DeployContext { session: &session }).unwrap();

        assert_eq!(
            session.log(),
            vec![
                "exists /opt/app".to_string(),
                "mkdir /opt/backup/2024-01-01_00-00-00".to_string(),
                format!("exec {}", backup_command("/opt/app", "/opt/backup/2024-01-01_00-00-00")),
            ]
        );
    }

    #[test]
    fn start_fails_when_compose_file_never_appears() {
        let session = RecordingSession::default();
        let step = DeployStep::Start {
            compose_file: "/opt/app/docker-compose.yaml".to_string(),
            settle: Settle {
                delay: Duration::ZERO,
                attempts: 2,
            },
        };

        let err = step.run(&DeployContext { session: &session }).unwrap_err();

        assert_eq!(err.code.as_str(), "precondition.compose_file_missing");
        let log = session.log();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|e| e == "exists /opt/app/docker-compose.yaml"));
    }

    #[test]
    fn commands_quote_their_paths() {
        assert_eq!(
            compose_down_command("/opt/app/docker-compose.yaml"),
            "docker compose -f '/opt/app/docker-compose.yaml' down -v"
        );
        assert_eq!(
            compose_up_command("/opt/app/docker-compose.yaml"),
            "docker compose -f '/opt/app/docker-compose.yaml' up -d --build"
        );
        assert_eq!(
            backup_command("/opt/app", "/opt/backup/2024-01-01_00-00-00"),
            "cp -r '/opt/app' '/opt/backup/2024-01-01_00-00-00'"
        );
    }

    #[test]
    fn pipeline_has_fixed_order() {
        let paths = ResolvedPaths {
            vaadin_project_dir: PathBuf::from("/p"),
            local_root: PathBuf::from("/p/_deployment/d"),
            local_deploy_dir: PathBuf::from("/p/_deployment/d/opt/app"),
            local_apps_data_dir: PathBuf::from("/p/_deployment/d/opt/data"),
            local_target_dir: PathBuf::from("/p/target"),
            remote_deploy_dir: "/opt/app".to_string(),
            remote_apps_data_dir: "/opt/data".to_string(),
            remote_compose_file: "/opt/app/docker-compose.yaml".to_string(),
            remote_target_dir: "/opt/app/target".to_string(),
            remote_backup_dir: None,
        };
        let settle = Settle {
            delay: Duration::ZERO,
            attempts: 1,
        };
        let steps = deploy_pipeline(&paths, "jar", settle);
        let ids: Vec<&str> = steps
            .iter()
            .map(DeployStep::id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "check_dockerfile",
                "check_artifact",
                "check_compose",
                "stop",
                "backup",
                "upload_deployment",
                "upload_apps_data",
                "upload_artifact",
                "start",
            ]
        );
    }
}
