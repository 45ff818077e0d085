//! Init orchestration: stage the local deployment folders for every
//! configured server. Nothing here talks to a remote host.

use crate::config::DeployConfig;
use crate::deploy::{RunSummary, ServerStatus};
use crate::error::{Error, Result};
use crate::paths::ResolvedPaths;
use crate::pipeline::{init_pipeline, ErrorReport, InitContext, PipelineRunResult, Runner};
use crate::placeholders::PlaceholderMap;
use crate::server::{EnvironmentClass, ServerEntry};
use crate::templates::{BuiltinTemplates, DirTemplates, TemplateSource};
use crate::validator::{ValidationRules, Validator};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInitResult {
    pub domain: String,
    pub environment: EnvironmentClass,
    pub status: ServerStatus,
    pub paths: ResolvedPaths,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineRunResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    #[serde(skip)]
    pub failure: Option<Error>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOrchestrationResult {
    pub templates: String,
    pub results: Vec<ServerInitResult>,
    pub summary: RunSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl InitOrchestrationResult {
    pub fn first_failure(&self) -> Option<&Error> {
        self.results.iter().find_map(|r| r.failure.as_ref())
    }
}

/// Templates from `templatesDir` when configured, otherwise the built-in set.
pub fn template_source(config: &DeployConfig) -> Box<dyn TemplateSource> {
    match &config.templates_dir {
        Some(dir) => Box::new(DirTemplates::new(dir)),
        None => Box::new(BuiltinTemplates),
    }
}

pub fn run(config: &DeployConfig) -> Result<InitOrchestrationResult> {
    let templates = template_source(config);
    run_with_templates(config, templates.as_ref())
}

/// Initialize every configured server that has no local staging folder yet.
/// A failing server does not stop the others.
pub fn run_with_templates(
    config: &DeployConfig,
    templates: &dyn TemplateSource,
) -> Result<InitOrchestrationResult> {
    let artifact_id = config.require_artifact_id()?;
    let report = Validator::new(ValidationRules::default())?
        .validate(config.certbot_email.as_deref(), &config.servers)?;
    let certbot_email = config.certbot_email.as_deref().unwrap_or_default();

    let servers = config
        .servers
        .iter()
        .map(ServerEntry::from_config)
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(templates = %templates.origin(), servers = servers.len(), "Initializing");

    let mut results = Vec::with_capacity(servers.len());
    let mut summary = RunSummary::default();
    let mut warnings = report.warnings;

    for server in &servers {
        let paths =
            ResolvedPaths::resolve(server, &config.project_base_dir, &config.vaadin_project_dir);

        let result = if paths.already_initialized() {
            let reason = format!(
                "`{}` already exists; delete it to initialize {} again",
                paths.local_root.display(),
                server.domain
            );
            tracing::warn!(server = %server.label(), "{}", reason);
            warnings.push(reason.clone());
            ServerInitResult {
                domain: server.domain.clone(),
                environment: server.environment_class,
                status: ServerStatus::Skipped,
                paths,
                reason: Some(reason),
                pipeline: None,
                error: None,
                failure: None,
            }
        } else {
            tracing::info!(server = %server.label(), "Initializing server");
            init_server(server, paths, templates, artifact_id, certbot_email)
        };

        if let Some(run) = &result.pipeline {
            warnings.extend(run.warnings());
        }
        summary.record(result.status);
        results.push(result);
    }

    Ok(InitOrchestrationResult {
        templates: templates.origin(),
        results,
        summary,
        warnings,
    })
}

fn init_server(
    server: &ServerEntry,
    paths: ResolvedPaths,
    templates: &dyn TemplateSource,
    artifact_id: &str,
    certbot_email: &str,
) -> ServerInitResult {
    let placeholders = PlaceholderMap::build(server, &paths, artifact_id, certbot_email);
    let ctx = InitContext {
        templates,
        placeholders: &placeholders,
    };

    let (pipeline, failure) = match Runner::new(init_pipeline(server, &paths)).run(&ctx) {
        Ok(mut run) => {
            let failure = run.failure.take();
            (Some(run), failure)
        }
        Err(err) => (None, Some(err)),
    };

    ServerInitResult {
        domain: server.domain.clone(),
        environment: server.environment_class,
        status: if failure.is_none() {
            ServerStatus::Succeeded
        } else {
            ServerStatus::Failed
        },
        paths,
        reason: None,
        pipeline,
        error: failure.as_ref().map(ErrorReport::from),
        failure,
    }
}
