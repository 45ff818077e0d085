//! Ordered, fail-fast step execution.
//!
//! A [`Runner`] holds a list of step descriptors and runs them one after the
//! other against a shared context. The first failing step stops the run;
//! nothing that already ran is rolled back.

mod deploy;
mod init;

pub use deploy::{deploy_pipeline, DeployContext, DeployStep, Settle};
pub use init::{init_pipeline, InitContext, InitStep};

use crate::error::{Error, Hint, Result};
use crate::paths::DOCKERFILE_NAME;
use serde::Serialize;
use std::path::Path;

/// What a finished step reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed { detail: Option<String> },
    /// The step chose not to act. The reason is logged as a warning.
    Skipped { reason: String },
}

impl StepOutcome {
    pub fn done() -> Self {
        StepOutcome::Completed { detail: None }
    }

    pub fn detail(detail: impl Into<String>) -> Self {
        StepOutcome::Completed {
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::Skipped {
            reason: reason.into(),
        }
    }
}

pub trait Step<C: ?Sized> {
    /// Stable identifier used in reports.
    fn id(&self) -> &'static str;

    /// Human readable description. Must not have side effects.
    fn describe(&self, ctx: &C) -> String;

    fn run(&self, ctx: &C) -> Result<StepOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Skipped,
    Failed,
    NotRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineRunStatus {
    Success,
    Failed,
}

/// Serializable view of an [`Error`] for reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code.as_str().to_string(),
            message: err.message.clone(),
            details: err.details.clone(),
            hints: err.hints.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStepResult {
    pub id: String,
    pub description: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSummary {
    pub total_steps: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub not_run: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunResult {
    pub steps: Vec<PipelineStepResult>,
    pub status: PipelineRunStatus,
    pub summary: PipelineRunSummary,
    #[serde(skip)]
    pub failure: Option<Error>,
}

impl PipelineRunResult {
    pub fn is_success(&self) -> bool {
        self.status == PipelineRunStatus::Success
    }

    /// Turn a failed run back into its step error.
    pub fn into_result(self) -> Result<Self> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Skipped)
            .filter_map(|s| s.detail.clone())
            .collect()
    }
}

pub struct Runner<S> {
    steps: Vec<S>,
}

impl<S> Runner<S> {
    pub fn new(steps: Vec<S>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// An empty step list is `pipeline.no_steps`. A failing step does not
    /// make this return `Err`; the failure is recorded in the result.
    pub fn run<C: ?Sized>(&self, ctx: &C) -> Result<PipelineRunResult>
    where
        S: Step<C>,
    {
        if self.steps.is_empty() {
            return Err(Error::pipeline_no_steps());
        }

        let mut results = Vec::with_capacity(self.steps.len());
        let mut failure = None;

        for step in &self.steps {
            let description = step.describe(ctx);

            if failure.is_some() {
                results.push(PipelineStepResult {
                    id: step.id().to_string(),
                    description,
                    status: StepStatus::NotRun,
                    detail: None,
                    error: None,
                });
                continue;
            }

            tracing::info!(step = step.id(), "{}", description);

            let result = match step.run(ctx) {
                Ok(StepOutcome::Completed { detail }) => {
                    tracing::info!(step = step.id(), "OK");
                    PipelineStepResult {
                        id: step.id().to_string(),
                        description,
                        status: StepStatus::Completed,
                        detail,
                        error: None,
                    }
                }
                Ok(StepOutcome::Skipped { reason }) => {
                    tracing::warn!(step = step.id(), "{}", reason);
                    PipelineStepResult {
                        id: step.id().to_string(),
                        description,
                        status: StepStatus::Skipped,
                        detail: Some(reason),
                        error: None,
                    }
                }
                Err(err) => {
                    tracing::error!(step = step.id(), code = err.code.as_str(), "{}", err.message);
                    let report = ErrorReport::from(&err);
                    failure = Some(err);
                    PipelineStepResult {
                        id: step.id().to_string(),
                        description,
                        status: StepStatus::Failed,
                        detail: None,
                        error: Some(report),
                    }
                }
            };
            results.push(result);
        }

        let count = |status: StepStatus| results.iter().filter(|r| r.status == status).count();
        let summary = PipelineRunSummary {
            total_steps: results.len(),
            succeeded: count(StepStatus::Completed),
            skipped: count(StepStatus::Skipped),
            failed: count(StepStatus::Failed),
            not_run: count(StepStatus::NotRun),
        };

        Ok(PipelineRunResult {
            status: if failure.is_some() {
                PipelineRunStatus::Failed
            } else {
                PipelineRunStatus::Success
            },
            steps: results,
            summary,
            failure,
        })
    }
}

/// Shared by both pipelines: the Dockerfile must exist locally.
pub(crate) fn check_dockerfile(dir: &Path) -> Result<StepOutcome> {
    let dockerfile = dir.join(DOCKERFILE_NAME);
    if dockerfile.is_file() {
        Ok(StepOutcome::done())
    } else {
        Err(Error::dockerfile_missing(dockerfile.display().to_string()))
    }
}
