//! Required-value helpers that fail with `config.missing_key`.

use crate::error::{Error, Result};

pub fn require<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| Error::config_missing_key(key, None))
}

/// Require a string that is non-empty after trimming. Returns it trimmed.
pub fn require_non_blank<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    let trimmed = value.map(str::trim).filter(|v| !v.is_empty());
    require(trimmed, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_passes_values_through() {
        assert_eq!(require(Some(3), "port").unwrap(), 3);
    }

    #[test]
    fn require_reports_the_key() {
        let err = require::<u16>(None, "sshConnection").unwrap_err();
        assert_eq!(err.code.as_str(), "config.missing_key");
        assert_eq!(err.details["key"], "sshConnection");
    }

    #[test]
    fn blank_strings_count_as_missing() {
        assert_eq!(require_non_blank(Some("  shop "), "artifactId").unwrap(), "shop");
        assert!(require_non_blank(Some("   "), "artifactId").is_err());
        assert!(require_non_blank(None, "artifactId").is_err());
    }
}
