use super::{check_dockerfile, Step, StepOutcome};
use crate::error::Result;
use crate::paths::{ResolvedPaths, COMPOSE_FILE_NAME, DOCKERFILE_NAME};
use crate::placeholders::PlaceholderMap;
use crate::server::ServerEntry;
use crate::templates::{self, TemplateSource, APPS_DATA_DIR, CONFIGS_DIR, ENV_FILE_NAME};
use crate::utils::io;
use std::path::PathBuf;

pub struct InitContext<'a> {
    pub templates: &'a dyn TemplateSource,
    pub placeholders: &'a PlaceholderMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitStep {
    CheckDockerfile { dir: PathBuf },
    CreateEnvFile { template: String, dest: PathBuf },
    CreateComposeFile { template: String, dest: PathBuf },
    CopyConfigs { dest: PathBuf },
    CopyAppsData { dest: PathBuf },
    CopyDockerfile { source: PathBuf, dest: PathBuf, local: bool },
    SubstitutePlaceholders { root: PathBuf },
}

pub fn init_pipeline(server: &ServerEntry, paths: &ResolvedPaths) -> Vec<InitStep> {
    let provider = server.database_provider();
    let deploy_dir = &paths.local_deploy_dir;

    vec![
        InitStep::CheckDockerfile {
            dir: paths.vaadin_project_dir.clone(),
        },
        InitStep::CreateEnvFile {
            template: templates::env_template(provider),
            dest: deploy_dir.join(ENV_FILE_NAME),
        },
        InitStep::CreateComposeFile {
            template: templates::compose_template(provider),
            dest: deploy_dir.join(COMPOSE_FILE_NAME),
        },
        InitStep::CopyConfigs {
            dest: deploy_dir.join(CONFIGS_DIR),
        },
        InitStep::CopyAppsData {
            dest: paths.local_apps_data_dir.clone(),
        },
        InitStep::CopyDockerfile {
            source: paths.vaadin_dockerfile(),
            dest: deploy_dir.join(DOCKERFILE_NAME),
            local: server.environment_class.is_local(),
        },
        InitStep::SubstitutePlaceholders {
            root: deploy_dir.clone(),
        },
    ]
}

impl InitStep {
    pub fn id(&self) -> &'static str {
        match self {
            InitStep::CheckDockerfile { .. } => "check_dockerfile",
            InitStep::CreateEnvFile { .. } => "create_env_file",
            InitStep::CreateComposeFile { .. } => "create_compose_file",
            InitStep::CopyConfigs { .. } => "copy_configs",
            InitStep::CopyAppsData { .. } => "copy_apps_data",
            InitStep::CopyDockerfile { .. } => "copy_dockerfile",
            InitStep::SubstitutePlaceholders { .. } => "substitute_placeholders",
        }
    }
}

impl<'a> Step<InitContext<'a>> for InitStep {
    fn id(&self) -> &'static str {
        InitStep::id(self)
    }

    fn describe(&self, _ctx: &InitContext<'a>) -> String {
        match self {
            InitStep::CheckDockerfile { dir } => {
                format!("Check the Dockerfile exists in `{}`...", dir.display())
            }
            InitStep::CreateEnvFile { dest, .. } => {
                format!("Create .env file: `{}`...", dest.display())
            }
            InitStep::CreateComposeFile { dest, .. } => {
                format!("Create docker-compose.yaml file: `{}`...", dest.display())
            }
            InitStep::CopyConfigs { dest } => {
                format!("Create configurations in: `{}`", dest.display())
            }
            InitStep::CopyAppsData { dest } => {
                format!("Create apps_data folder: `{}`...", dest.display())
            }
            InitStep::CopyDockerfile { source, dest, .. } => format!(
                "Copy Dockerfile from `{}` to `{}`...",
                source.display(),
                dest.display()
            ),
            InitStep::SubstitutePlaceholders { root } => {
                format!("Substitute placeholders in `{}`...", root.display())
            }
        }
    }

    fn run(&self, ctx: &InitContext<'a>) -> Result<StepOutcome> {
        match self {
            InitStep::CheckDockerfile { dir } => check_dockerfile(dir),

            InitStep::CreateEnvFile { template, dest }
            | InitStep::CreateComposeFile { template, dest } => {
                let content = ctx.templates.read(template)?;
                io::write_file(dest, &content, "create from template")?;
                Ok(StepOutcome::detail(template.clone()))
            }

            InitStep::CopyConfigs { dest } => {
                let count = templates::copy_tree(ctx.templates, CONFIGS_DIR, dest)?;
                Ok(StepOutcome::detail(format!("{} files created", count)))
            }

            InitStep::CopyAppsData { dest } => {
                let count = templates::copy_tree(ctx.templates, APPS_DATA_DIR, dest)?;
                Ok(StepOutcome::detail(format!("{} files created", count)))
            }

            InitStep::CopyDockerfile {
                source,
                dest,
                local,
            } => {
                if *local {
                    return Ok(StepOutcome::detail(
                        "LOCAL servers build from the Vaadin project directory",
                    ));
                }
                io::copy_file(source, dest, "copy Dockerfile")?;
                Ok(StepOutcome::done())
            }

            InitStep::SubstitutePlaceholders { root } => {
                let changed = ctx.placeholders.substitute_tree(root)?;
                Ok(StepOutcome::detail(format!("{} files updated", changed)))
            }
        }
    }
}
