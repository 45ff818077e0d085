//! Text extraction from command output.

use regex::Regex;
use std::sync::OnceLock;

fn compose_version_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*Docker Compose version v(\d+\.\d+\.\d+)\s*$").ok())
        .as_ref()
}

/// Parse `docker compose version` output.
///
/// The whole output must be `Docker Compose version v<major>.<minor>.<patch>`,
/// surrounding whitespace allowed.
pub fn parse_compose_version(output: &str) -> Option<semver::Version> {
    let caps = compose_version_regex()?.captures(output)?;
    semver::Version::parse(caps.get(1)?.as_str()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_output() {
        let version = parse_compose_version("Docker Compose version v2.20.2\n").unwrap();
        assert_eq!(version, semver::Version::new(2, 20, 2));
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert!(parse_compose_version("  Docker Compose version v2.29.7  \r\n").is_some());
    }

    #[test]
    fn rejects_legacy_and_unexpected_output() {
        assert!(parse_compose_version("docker-compose version 1.29.2, build 5becea4c").is_none());
        assert!(parse_compose_version("docker: 'compose' is not a docker command.").is_none());
        assert!(parse_compose_version("Docker Compose version v2.20").is_none());
        assert!(parse_compose_version("").is_none());
    }
}
