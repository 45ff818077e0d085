use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigNotFound,
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    PreconditionDockerfileMissing,
    PreconditionArtifactMissing,
    PreconditionArtifactAmbiguous,
    PreconditionComposeUnavailable,
    PreconditionComposeFileMissing,
    PreconditionDeploymentMissing,

    SshIdentityFileNotFound,
    SshAuthFailed,
    SshConnectFailed,

    RemoteCommandFailed,
    RemoteIoError,

    PipelineNoSteps,

    TemplateNotFound,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigNotFound => "config.not_found",
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::PreconditionDockerfileMissing => "precondition.dockerfile_missing",
            ErrorCode::PreconditionArtifactMissing => "precondition.artifact_missing",
            ErrorCode::PreconditionArtifactAmbiguous => "precondition.artifact_ambiguous",
            ErrorCode::PreconditionComposeUnavailable => "precondition.compose_unavailable",
            ErrorCode::PreconditionComposeFileMissing => "precondition.compose_file_missing",
            ErrorCode::PreconditionDeploymentMissing => "precondition.deployment_missing",

            ErrorCode::SshIdentityFileNotFound => "ssh.identity_file_not_found",
            ErrorCode::SshAuthFailed => "ssh.auth_failed",
            ErrorCode::SshConnectFailed => "ssh.connect_failed",

            ErrorCode::RemoteCommandFailed => "remote.command_failed",
            ErrorCode::RemoteIoError => "remote.io_error",

            ErrorCode::PipelineNoSteps => "pipeline.no_steps",

            ErrorCode::TemplateNotFound => "template.not_found",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigNotFoundDetails {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

/// A list of violations reported together by one validator run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigViolationsDetails {
    pub violations: Vec<ConfigInvalidValueDetails>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreconditionDetails {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub found: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    /// Combined stdout and stderr of the remote command.
    pub output: String,
    pub target: TargetDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteIoErrorDetails {
    pub operation: String,
    pub path: String,
    pub error: String,
    pub target: TargetDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SshConnectDetails {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SshIdentityFileNotFoundDetails {
    pub host: String,
    pub identity_file: String,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.clone(),
            id,
            tried,
        });

        Self::new(ErrorCode::ValidationInvalidArgument, problem, details)
    }

    pub fn config_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file `{}` not found", path),
            to_details(ConfigNotFoundDetails { path }),
        )
        .with_hint("Pass --config <path> or create deploy.json in the current directory")
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::ConfigMissingKey,
            format!("Missing required configuration key '{}'", key),
            to_details(ConfigMissingKeyDetails { key, path }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.clone(),
        });

        Self::new(ErrorCode::ConfigInvalidValue, problem, details)
    }

    /// Folds several violations into a single configuration error.
    pub fn config_violations(violations: Vec<ConfigInvalidValueDetails>) -> Self {
        let message = match violations.as_slice() {
            [single] => single.problem.clone(),
            _ => format!(
                "Incorrect plugin configuration! {} problems found",
                violations.len()
            ),
        };
        let hints: Vec<String> = violations.iter().map(|v| v.problem.clone()).collect();

        let mut err = Self::new(
            ErrorCode::ConfigInvalidValue,
            message,
            to_details(ConfigViolationsDetails { violations }),
        );
        if hints.len() > 1 {
            for hint in hints {
                err = err.with_hint(hint);
            }
        }
        err
    }

    pub fn dockerfile_missing(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::PreconditionDockerfileMissing,
            format!("Dockerfile `{}` doesn't exist", path),
            to_details(PreconditionDetails {
                path,
                found: Vec::new(),
            }),
        )
        .with_hint("Create a Dockerfile in the Vaadin project root, for example:")
        .with_hint("FROM eclipse-temurin:17-jre")
        .with_hint("COPY target/*.jar app.jar")
        .with_hint("EXPOSE 8080")
        .with_hint("ENTRYPOINT [\"java\", \"-jar\", \"/app.jar\"]")
        .with_hint("Use eclipse-temurin:21-jre for Java 21 projects")
    }

    pub fn artifact_dir_missing(dir: impl Into<String>) -> Self {
        let dir = dir.into();
        Self::new(
            ErrorCode::PreconditionArtifactMissing,
            format!("Folder `{}` doesn't exist. Please build the project first!", dir),
            to_details(PreconditionDetails {
                path: dir,
                found: Vec::new(),
            }),
        )
        .with_hint("Run your build (for example `mvn clean package -Pproduction`) before deploying")
    }

    pub fn artifact_missing(dir: impl Into<String>, extension: &str) -> Self {
        let dir = dir.into();
        Self::new(
            ErrorCode::PreconditionArtifactMissing,
            format!(
                "Built `*.{}` file doesn't exist in `{}`. Please build the project first!",
                extension, dir
            ),
            to_details(PreconditionDetails {
                path: dir,
                found: Vec::new(),
            }),
        )
    }

    pub fn artifact_ambiguous(dir: impl Into<String>, extension: &str, found: Vec<String>) -> Self {
        let dir = dir.into();
        Self::new(
            ErrorCode::PreconditionArtifactAmbiguous,
            format!(
                "Ambiguity! More than one `.{}` file is found in `{}`",
                extension, dir
            ),
            to_details(PreconditionDetails { path: dir, found }),
        )
        .with_hint("Clean the target folder so exactly one package remains, then build again")
    }

    pub fn compose_unavailable(output: impl Into<String>) -> Self {
        let output = output.into();
        Self::new(
            ErrorCode::PreconditionComposeUnavailable,
            "Docker Compose is not installed on the server",
            serde_json::json!({ "output": output }),
        )
        .with_hint("Install the Docker Compose v2 plugin on the server")
    }

    pub fn compose_file_missing(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::PreconditionComposeFileMissing,
            format!("Something went wrong! File `{}` doesn't exist on the server", path),
            to_details(PreconditionDetails {
                path,
                found: Vec::new(),
            }),
        )
    }

    pub fn deployment_missing(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::PreconditionDeploymentMissing,
            format!("Local deployment folder `{}` doesn't exist", path),
            to_details(PreconditionDetails {
                path,
                found: Vec::new(),
            }),
        )
        .with_hint("Run `vaadin-deploy init` to scaffold the deployment files first")
    }

    pub fn ssh_identity_file_not_found(
        host: impl Into<String>,
        identity_file: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::SshIdentityFileNotFound,
            "SSH identity file not found",
            to_details(SshIdentityFileNotFoundDetails {
                host: host.into(),
                identity_file: identity_file.into(),
            }),
        )
    }

    pub fn ssh_auth_failed(details: SshConnectDetails) -> Self {
        Self::new(ErrorCode::SshAuthFailed, "SSH authentication failed", to_details(details))
            .with_hint("Ssh configurations are incorrect. Please double check...")
    }

    pub fn ssh_connect_failed(details: SshConnectDetails) -> Self {
        let mut err = Self::new(
            ErrorCode::SshConnectFailed,
            "SSH connection failed",
            to_details(details),
        );
        err.retryable = Some(true);
        err
    }

    pub fn remote_command_failed(details: RemoteCommandFailedDetails) -> Self {
        let message = format!(
            "Remote command `{}` exited with status {}",
            details.command, details.exit_code
        );
        Self::new(ErrorCode::RemoteCommandFailed, message, to_details(details))
    }

    pub fn remote_io(details: RemoteIoErrorDetails) -> Self {
        let message = format!("Remote {} failed for `{}`", details.operation, details.path);
        Self::new(ErrorCode::RemoteIoError, message, to_details(details))
    }

    pub fn pipeline_no_steps() -> Self {
        Self::new(
            ErrorCode::PipelineNoSteps,
            "No steps to execute!",
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn template_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::TemplateNotFound,
            format!("Template resource `{}` not found", path),
            serde_json::json!({ "path": path }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
