use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "deploy.json";
pub const DEFAULT_PACKAGING: &str = "jar";

/// Database credentials written into freshly scaffolded `.env` files.
pub const DEFAULT_DB_USER: &str = "user";
pub const DEFAULT_DB_PASSWORD: &str = "P@ssword#5202";

/// Tunables under the `settings` key of the deployment config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_server_alive_interval_secs")]
    pub server_alive_interval_secs: u64,

    /// Wait before the Start step looks for the compose file.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,

    /// How many times Start looks for the compose file before failing.
    #[serde(default = "default_settle_attempts")]
    pub settle_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            server_alive_interval_secs: default_server_alive_interval_secs(),
            settle_delay_secs: default_settle_delay_secs(),
            settle_attempts: default_settle_attempts(),
        }
    }
}

impl Settings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_server_alive_interval_secs() -> u64 {
    15
}

fn default_settle_delay_secs() -> u64 {
    2
}

fn default_settle_attempts() -> u32 {
    1
}

pub fn ssh_user() -> String {
    "root".to_string()
}

pub fn ssh_port() -> u16 {
    22
}

pub fn packaging() -> String {
    DEFAULT_PACKAGING.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.settle_delay(), Duration::from_secs(2));
        assert_eq!(settings.settle_attempts, 1);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"settleDelaySecs": 0}"#).unwrap();
        assert_eq!(settings.settle_delay_secs, 0);
        assert_eq!(settings.connect_timeout_secs, 10);
    }
}
