//! Structural checks over the raw server entries.
//!
//! Every check runs for every server before anything else happens. Failures
//! are collected and reported together as one configuration error; soft
//! findings come back as warnings.

use crate::error::{ConfigInvalidValueDetails, Error, Result};
use crate::server::{DatabaseProvider, EnvironmentClass, ServerConfig};
use regex::Regex;
use serde::Serialize;

pub const EMAIL_PATTERN: &str =
    r"^[a-zA-Z0-9_+&*-]+(?:\.[a-zA-Z0-9_+&*-]+)*@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,7}$";

/// Immutable allow-lists the validator checks against.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub environment_classes: Vec<EnvironmentClass>,
    pub database_providers: Vec<DatabaseProvider>,
    pub email_pattern: String,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            environment_classes: EnvironmentClass::ALL.to_vec(),
            database_providers: DatabaseProvider::ALL.to_vec(),
            email_pattern: EMAIL_PATTERN.to_string(),
        }
    }
}

/// Result of a single check against one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Pass,
    Warn(String),
    Fail {
        key: &'static str,
        value: Option<String>,
        problem: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub servers: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

type ServerCheck = fn(&Validator, &ServerConfig) -> Check;

const SERVER_CHECKS: &[ServerCheck] = &[
    Validator::check_domain,
    Validator::check_environment_class,
    Validator::check_ssh_connection,
    Validator::check_deploy_dir,
    Validator::check_apps_data_dir,
    Validator::check_backup_dir,
    Validator::check_database_provider,
];

pub struct Validator {
    rules: ValidationRules,
    email: Regex,
}

impl Validator {
    pub fn new(rules: ValidationRules) -> Result<Self> {
        let email = Regex::new(&rules.email_pattern).map_err(|e| {
            Error::config_invalid_value(
                "emailPattern",
                Some(rules.email_pattern.clone()),
                e.to_string(),
            )
        })?;
        Ok(Self { rules, email })
    }

    /// Run every check. Any failure aborts with one aggregated error.
    pub fn validate(
        &self,
        certbot_email: Option<&str>,
        servers: &[ServerConfig],
    ) -> Result<ValidationReport> {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        if let Check::Fail {
            key,
            value,
            problem,
        } = self.check_email(certbot_email)
        {
            violations.push(ConfigInvalidValueDetails {
                key: key.to_string(),
                value,
                problem,
            });
        }

        for (index, server) in servers.iter().enumerate() {
            for check in self.check_server(server) {
                match check {
                    Check::Pass => {}
                    Check::Warn(message) => {
                        tracing::warn!(server = index, "{}", message);
                        warnings.push(message);
                    }
                    Check::Fail {
                        key,
                        value,
                        problem,
                    } => violations.push(ConfigInvalidValueDetails {
                        key: format!("servers[{}].{}", index, key),
                        value,
                        problem,
                    }),
                }
            }
        }

        if violations.is_empty() {
            Ok(ValidationReport {
                servers: servers.len(),
                warnings,
            })
        } else {
            Err(Error::config_violations(violations))
        }
    }

    pub fn check_server(&self, server: &ServerConfig) -> Vec<Check> {
        SERVER_CHECKS.iter().map(|check| check(self, server)).collect()
    }

    /// The raw value is matched untrimmed: surrounding whitespace is invalid.
    pub fn check_email(&self, email: Option<&str>) -> Check {
        match email {
            Some(value) if self.email.is_match(value) => Check::Pass,
            _ => Check::Fail {
                key: "certbotEmail",
                value: email.map(str::to_string),
                problem: format!(
                    "Email value `{}` is invalid. Please specify the correct email address.",
                    email.unwrap_or_default()
                ),
            },
        }
    }

    /// The domain names the local staging folder, so it must stay a single
    /// path segment.
    pub fn check_domain(&self, server: &ServerConfig) -> Check {
        let domain = server.domain.as_deref().map(str::trim).unwrap_or_default();
        let single_segment =
            !domain.contains(['/', '\\']) && domain != "." && domain != "..";
        if domain.is_empty() || !single_segment {
            return Check::Fail {
                key: "domain",
                value: server.domain.clone(),
                problem: format!(
                    "Incorrect plugin configuration! 'server.domain' must be properly set. \
                     For example: 'www.softake.eu'. Current value is `{}`",
                    server.domain.as_deref().unwrap_or_default()
                ),
            };
        }
        Check::Pass
    }

    pub fn check_environment_class(&self, server: &ServerConfig) -> Check {
        let class = server
            .environment_class
            .as_deref()
            .and_then(EnvironmentClass::parse)
            .filter(|c| self.rules.environment_classes.contains(c));

        match class {
            Some(_) => Check::Pass,
            None => {
                let allowed: Vec<&str> = self
                    .rules
                    .environment_classes
                    .iter()
                    .map(EnvironmentClass::as_str)
                    .collect();
                Check::Fail {
                    key: "type",
                    value: server.environment_class.clone(),
                    problem: format!(
                        "Incorrect plugin configuration for server: `{}`! Select one of the \
                         constraints [{}] for 'server.type' field.",
                        display_domain(server),
                        allowed.join(", ")
                    ),
                }
            }
        }
    }

    /// Unknown classes are reported by `check_environment_class` instead.
    pub fn check_ssh_connection(&self, server: &ServerConfig) -> Check {
        let Some(class) = server
            .environment_class
            .as_deref()
            .and_then(EnvironmentClass::parse)
        else {
            return Check::Pass;
        };

        match (class.is_local(), server.ssh_connection.as_ref()) {
            (true, Some(_)) => Check::Warn(format!(
                "'sshConnection' property is redundant for servers of type 'LOCAL'. It doesn't \
                 affect functionality, but the configuration is incorrect. Remove \
                 'sshConnection' from `{}` server!",
                display_domain(server)
            )),
            (true, None) => Check::Pass,
            (false, None) => Check::Fail {
                key: "sshConnection",
                value: None,
                problem: format!(
                    "Incorrect plugin configuration for server: `{}`! If 'server.type' is not \
                     LOCAL then sshConnection must be set!",
                    display_domain(server)
                ),
            },
            (false, Some(ssh)) => {
                let has_host = ssh.host.as_deref().is_some_and(|h| !h.trim().is_empty());
                let has_credentials = ssh
                    .identity_file
                    .as_deref()
                    .is_some_and(|f| !f.trim().is_empty())
                    || ssh.password.as_deref().is_some_and(|p| !p.is_empty());

                if !has_host {
                    Check::Fail {
                        key: "sshConnection.host",
                        value: ssh.host.clone(),
                        problem: format!(
                            "Incorrect plugin configuration for server: `{}`! \
                             'sshConnection.host' must be set",
                            display_domain(server)
                        ),
                    }
                } else if !has_credentials {
                    Check::Fail {
                        key: "sshConnection.identityFile",
                        value: None,
                        problem: format!(
                            "Incorrect plugin configuration for server: `{}`! Either \
                             'sshConnection.identityFile' or 'sshConnection.password' must be set",
                            display_domain(server)
                        ),
                    }
                } else {
                    Check::Pass
                }
            }
        }
    }

    pub fn check_deploy_dir(&self, server: &ServerConfig) -> Check {
        required_absolute_dir(
            "deployDir",
            server.deploy_dir.as_deref(),
            "/opt/vaadin-app",
        )
    }

    pub fn check_apps_data_dir(&self, server: &ServerConfig) -> Check {
        required_absolute_dir(
            "appsDataDir",
            server.apps_data_dir.as_deref(),
            "/opt/apps_data",
        )
    }

    /// Absence is allowed and disables the backup step.
    pub fn check_backup_dir(&self, server: &ServerConfig) -> Check {
        match server.backup_dir.as_deref() {
            Some(dir) if !dir.trim().starts_with('/') => Check::Fail {
                key: "backupDir",
                value: Some(dir.to_string()),
                problem: format!(
                    "Incorrect plugin configuration! Value of 'server.backupDir' must start with \
                     '/'. For example: '/opt/backup'. Current value is `{}`",
                    dir
                ),
            },
            _ => Check::Pass,
        }
    }

    /// Absence is allowed; the provider defaults to `nodatabase` at use sites.
    pub fn check_database_provider(&self, server: &ServerConfig) -> Check {
        let Some(raw) = server.db_provider.as_deref() else {
            return Check::Pass;
        };

        let known = DatabaseProvider::parse(raw)
            .filter(|p| self.rules.database_providers.contains(p))
            .is_some();
        if known {
            return Check::Pass;
        }

        let allowed: Vec<&str> = self
            .rules
            .database_providers
            .iter()
            .map(DatabaseProvider::as_str)
            .collect();
        Check::Fail {
            key: "dbProvider",
            value: Some(raw.to_string()),
            problem: format!(
                "Incorrect plugin configuration for server: `{}`! 'server.dbProvider' must be \
                 one of the following: [{}]. The current value is `{}`",
                display_domain(server),
                allowed.join(", "),
                raw
            ),
        }
    }
}

fn required_absolute_dir(key: &'static str, value: Option<&str>, example: &str) -> Check {
    match value {
        Some(dir) if dir.trim().starts_with('/') => Check::Pass,
        _ => Check::Fail {
            key,
            value: value.map(str::to_string),
            problem: format!(
                "Incorrect plugin configuration! 'server.{}' must be set and start with '/'. \
                 For example: '{}'. Current value is `{}`",
                key,
                example,
                value.unwrap_or_default()
            ),
        },
    }
}

fn display_domain(server: &ServerConfig) -> &str {
    server.domain.as_deref().map(str::trim).unwrap_or_default()
}
