//! Deploy orchestration: validate the config, pick the servers of one
//! environment class, and run the deploy pipeline against each of them.

use crate::config::DeployConfig;
use crate::error::{Error, Result, SshConnectDetails};
use crate::paths::ResolvedPaths;
use crate::pipeline::{
    deploy_pipeline, DeployContext, ErrorReport, PipelineRunResult, Runner, Settle,
};
use crate::server::{EnvironmentClass, ServerEntry, SshConnection};
use crate::ssh::{RemoteSession, SessionFactory};
use crate::utils::validation;
use crate::validator::{ValidationRules, Validator};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    /// Continue with the next server after one fails.
    pub keep_going: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDeployResult {
    pub domain: String,
    pub environment: EnvironmentClass,
    pub status: ServerStatus,
    pub paths: ResolvedPaths,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineRunResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    #[serde(skip)]
    pub failure: Option<Error>,
}

/// Per-server tally shared by the deploy and init reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl RunSummary {
    pub fn record(&mut self, status: ServerStatus) {
        self.total += 1;
        match status {
            ServerStatus::Succeeded => self.succeeded += 1,
            ServerStatus::Failed => self.failed += 1,
            ServerStatus::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOrchestrationResult {
    pub environment: EnvironmentClass,
    pub results: Vec<ServerDeployResult>,
    pub summary: RunSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DeployOrchestrationResult {
    /// First server error, if any server failed.
    pub fn first_failure(&self) -> Option<&Error> {
        self.results.iter().find_map(|r| r.failure.as_ref())
    }
}

/// Deploy every configured server of `environment`.
///
/// Validation errors abort before any server is touched. Server failures are
/// recorded in the result instead of being returned.
pub fn run(
    config: &DeployConfig,
    environment: EnvironmentClass,
    options: DeployOptions,
    sessions: &dyn SessionFactory,
) -> Result<DeployOrchestrationResult> {
    if environment.is_local() {
        return Err(Error::validation_invalid_argument(
            "environment",
            "LOCAL servers are run with docker compose directly and cannot be deployed",
            Some(environment.as_str().to_string()),
            Some(
                EnvironmentClass::ALL
                    .iter()
                    .filter(|c| !c.is_local())
                    .map(|c| c.as_str().to_string())
                    .collect(),
            ),
        ));
    }

    let report = Validator::new(ValidationRules::default())?
        .validate(config.certbot_email.as_deref(), &config.servers)?;

    let targets = select_servers(config, environment)?;
    let mut warnings = report.warnings;
    if targets.is_empty() {
        let message = format!(
            "No configurations are found for `{}` server type. Skipping deployment process",
            environment
        );
        tracing::warn!("{}", message);
        warnings.push(message);
        return Ok(DeployOrchestrationResult {
            environment,
            results: Vec::new(),
            summary: RunSummary::default(),
            warnings,
        });
    }

    let settle = Settle {
        delay: config.settings.settle_delay(),
        attempts: config.settings.settle_attempts,
    };

    let mut results = Vec::with_capacity(targets.len());
    let mut summary = RunSummary::default();
    let mut halted = false;

    for server in &targets {
        let paths =
            ResolvedPaths::resolve(server, &config.project_base_dir, &config.vaadin_project_dir);

        let result = if halted {
            tracing::warn!(server = %server.label(), "Skipped after an earlier failure");
            ServerDeployResult::skipped(server, paths)
        } else {
            tracing::info!(server = %server.label(), "Deploying");
            deploy_server(server, paths, config.packaging(), settle, sessions)
        };

        if let Some(run) = &result.pipeline {
            warnings.extend(run.warnings());
        }
        if result.status == ServerStatus::Failed {
            if let Some(err) = &result.failure {
                tracing::error!(server = %server.label(), code = err.code.as_str(), "{}", err.message);
            }
            halted = !options.keep_going;
        }
        summary.record(result.status);
        results.push(result);
    }

    Ok(DeployOrchestrationResult {
        environment,
        results,
        summary,
        warnings,
    })
}

/// Servers of `environment`, in configuration order. Empty when none match.
pub fn select_servers(
    config: &DeployConfig,
    environment: EnvironmentClass,
) -> Result<Vec<ServerEntry>> {
    let mut selected = Vec::new();
    for raw in &config.servers {
        let entry = ServerEntry::from_config(raw)?;
        if entry.environment_class == environment {
            selected.push(entry);
        }
    }
    Ok(selected)
}

fn deploy_server(
    server: &ServerEntry,
    paths: ResolvedPaths,
    packaging: &str,
    settle: Settle,
    sessions: &dyn SessionFactory,
) -> ServerDeployResult {
    let steps = deploy_pipeline(&paths, packaging, settle);

    let outcome = connection(server)
        .and_then(|conn| open_session(sessions, conn))
        .and_then(|session| {
            let ctx = DeployContext {
                session: session.as_ref(),
            };
            Runner::new(steps).run(&ctx)
        });

    match outcome {
        Ok(mut run) => {
            let failure = run.failure.take();
            ServerDeployResult {
                domain: server.domain.clone(),
                environment: server.environment_class,
                status: if failure.is_none() {
                    ServerStatus::Succeeded
                } else {
                    ServerStatus::Failed
                },
                paths,
                error: failure.as_ref().map(ErrorReport::from),
                pipeline: Some(run),
                failure,
            }
        }
        Err(err) => ServerDeployResult {
            domain: server.domain.clone(),
            environment: server.environment_class,
            status: ServerStatus::Failed,
            paths,
            pipeline: None,
            error: Some(ErrorReport::from(&err)),
            failure: Some(err),
        },
    }
}

fn connection(server: &ServerEntry) -> Result<&SshConnection> {
    validation::require(server.ssh_connection.as_ref(), "sshConnection")
}

fn open_session(
    sessions: &dyn SessionFactory,
    connection: &SshConnection,
) -> Result<Box<dyn RemoteSession>> {
    let session = sessions.open(connection)?;
    if !session.is_session_valid() {
        return Err(Error::ssh_connect_failed(SshConnectDetails {
            host: connection.host.clone(),
            user: connection.user.clone(),
            port: connection.port,
            error: "Session is not usable after connecting".to_string(),
        }));
    }
    tracing::debug!(target_host = %connection.target(), "Session ready");
    Ok(session)
}

impl ServerDeployResult {
    fn skipped(server: &ServerEntry, paths: ResolvedPaths) -> Self {
        Self {
            domain: server.domain.clone(),
            environment: server.environment_class,
            status: ServerStatus::Skipped,
            paths,
            pipeline: None,
            error: None,
            failure: None,
        }
    }
}
