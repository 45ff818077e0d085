//! Server entries: the raw configuration shape and the typed, normalized form.

use crate::defaults;
use crate::error::{Error, Result};
use crate::paths::normalize_dir;
use serde::{Deserialize, Serialize};

/// Deployment environment a server belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentClass {
    Local,
    Test,
    Qa,
    Staging,
    Prod,
}

impl EnvironmentClass {
    pub const ALL: [EnvironmentClass; 5] = [
        EnvironmentClass::Local,
        EnvironmentClass::Test,
        EnvironmentClass::Qa,
        EnvironmentClass::Staging,
        EnvironmentClass::Prod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentClass::Local => "LOCAL",
            EnvironmentClass::Test => "TEST",
            EnvironmentClass::Qa => "QA",
            EnvironmentClass::Staging => "STAGING",
            EnvironmentClass::Prod => "PROD",
        }
    }

    /// Case-insensitive parse. `STG` is accepted for staging.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOCAL" => Some(EnvironmentClass::Local),
            "TEST" => Some(EnvironmentClass::Test),
            "QA" => Some(EnvironmentClass::Qa),
            "STAGING" | "STG" => Some(EnvironmentClass::Staging),
            "PROD" => Some(EnvironmentClass::Prod),
            _ => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, EnvironmentClass::Local)
    }
}

impl std::fmt::Display for EnvironmentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvider {
    Postgres,
    Mariadb,
    #[default]
    #[serde(rename = "nodatabase")]
    NoDatabase,
}

impl DatabaseProvider {
    pub const ALL: [DatabaseProvider; 3] = [
        DatabaseProvider::Postgres,
        DatabaseProvider::Mariadb,
        DatabaseProvider::NoDatabase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseProvider::Postgres => "postgres",
            DatabaseProvider::Mariadb => "mariadb",
            DatabaseProvider::NoDatabase => "nodatabase",
        }
    }

    /// Case-insensitive parse of a trimmed value.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == normalized)
    }
}

/// A server entry exactly as written in the configuration file.
///
/// Every field is optional so the validator can report what is missing
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(rename = "type", alias = "environmentClass", default)]
    pub environment_class: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(alias = "databaseProvider", default)]
    pub db_provider: Option<String>,
    #[serde(default)]
    pub deploy_dir: Option<String>,
    #[serde(default)]
    pub apps_data_dir: Option<String>,
    #[serde(default)]
    pub backup_dir: Option<String>,
    #[serde(default)]
    pub ssh_connection: Option<SshConnectionConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshConnectionConfig {
    #[serde(alias = "hostName", default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub identity_file: Option<String>,
    #[serde(default, skip_serializing)]
    pub passphrase: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshAuth {
    IdentityFile {
        path: String,
        passphrase: Option<String>,
    },
    Password(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshConnection {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub auth: SshAuth,
}

impl SshConnection {
    /// Identity file wins over a password when both are configured.
    pub fn from_config(config: &SshConnectionConfig) -> Result<Self> {
        let host = non_blank(config.host.as_deref())
            .ok_or_else(|| Error::config_missing_key("sshConnection.host", None))?;

        let auth = match (
            non_blank(config.identity_file.as_deref()),
            config.password.as_deref().filter(|p| !p.is_empty()),
        ) {
            (Some(path), _) => SshAuth::IdentityFile {
                path,
                passphrase: config.passphrase.clone().filter(|p| !p.is_empty()),
            },
            (None, Some(password)) => SshAuth::Password(password.to_string()),
            (None, None) => {
                return Err(Error::config_missing_key(
                    "sshConnection.identityFile",
                    None,
                )
                .with_hint("Set either 'identityFile' or 'password' for the SSH connection"))
            }
        };

        Ok(Self {
            host,
            user: non_blank(config.user.as_deref()).unwrap_or_else(defaults::ssh_user),
            port: config.port.unwrap_or_else(defaults::ssh_port),
            auth,
        })
    }

    pub fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// A validated, normalized deployment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub environment_class: EnvironmentClass,
    pub domain: String,
    pub database_provider: Option<DatabaseProvider>,
    pub deploy_dir: String,
    pub apps_data_dir: String,
    pub backup_dir: Option<String>,
    pub ssh_connection: Option<SshConnection>,
}

impl ServerEntry {
    /// Build the typed entry from a raw config that already passed validation.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let raw_class = config.environment_class.as_deref().unwrap_or_default();
        let environment_class = EnvironmentClass::parse(raw_class).ok_or_else(|| {
            Error::config_invalid_value(
                "type",
                config.environment_class.clone(),
                "Unknown server type",
            )
        })?;

        let domain = non_blank(config.domain.as_deref())
            .ok_or_else(|| Error::config_missing_key("domain", None))?;

        let database_provider = match non_blank(config.db_provider.as_deref()) {
            Some(raw) => Some(DatabaseProvider::parse(&raw).ok_or_else(|| {
                Error::config_invalid_value("dbProvider", Some(raw.clone()), "Unknown provider")
            })?),
            None => None,
        };

        let deploy_dir = config
            .deploy_dir
            .as_deref()
            .map(normalize_dir)
            .ok_or_else(|| Error::config_missing_key("deployDir", None))?;
        let apps_data_dir = config
            .apps_data_dir
            .as_deref()
            .map(normalize_dir)
            .ok_or_else(|| Error::config_missing_key("appsDataDir", None))?;
        let backup_dir = config
            .backup_dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(normalize_dir);

        let ssh_connection = if environment_class.is_local() {
            None
        } else {
            let raw = config
                .ssh_connection
                .as_ref()
                .ok_or_else(|| Error::config_missing_key("sshConnection", None))?;
            Some(SshConnection::from_config(raw)?)
        };

        Ok(Self {
            environment_class,
            domain,
            database_provider,
            deploy_dir,
            apps_data_dir,
            backup_dir,
            ssh_connection,
        })
    }

    /// Provider used for template lookup. Unset means no database.
    pub fn database_provider(&self) -> DatabaseProvider {
        self.database_provider.unwrap_or_default()
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.domain, self.environment_class)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
