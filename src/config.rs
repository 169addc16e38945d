use std::time::Duration;

use crate::error::RepoCreatorError;

pub const DEFAULT_REPO_NAME: &str = "my-awesome-repo";
pub const DEFAULT_OWNER: &str = "byungjunkim12";
pub const DEFAULT_MCP_DESCRIPTION: &str = "My awesome repository created via MCP";
pub const DEFAULT_ANTHROPIC_DESCRIPTION: &str =
    "My awesome repository created via Anthropic MCP client";

pub const DEFAULT_MCP_BASE_URL: &str = "https://api.mcp-platform.com";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

pub const MCP_API_KEY_ENV: &str = "MCP_API_KEY";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Resolve a credential: explicit value > `env_name` from the process
/// environment. Empty values count as missing.
pub fn resolve_credential(
    explicit: Option<String>,
    env_name: &str,
) -> Result<String, RepoCreatorError> {
    resolve_credential_with(explicit, env_name, |name| std::env::var(name).ok())
}

/// Same as [`resolve_credential`] with a pluggable environment lookup.
pub fn resolve_credential_with<F>(
    explicit: Option<String>,
    env_name: &str,
    lookup: F,
) -> Result<String, RepoCreatorError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = explicit.filter(|v| !v.is_empty()) {
        return Ok(value);
    }
    match lookup(env_name) {
        Some(value) if !value.is_empty() => {
            tracing::info!(env = env_name, "Read API key from environment variable");
            Ok(value)
        }
        _ => Err(RepoCreatorError::Configuration(format!(
            "{} environment variable not set",
            env_name
        ))),
    }
}

/// Polling parameters for repository verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyConfig {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(2),
        }
    }
}

/// Per-request timeout from a seconds count, `0` meaning no timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_credential_wins() {
        let key = resolve_credential_with(Some("flag-key".into()), MCP_API_KEY_ENV, |_| {
            Some("env-key".into())
        });
        assert_eq!(key.unwrap(), "flag-key");
    }

    #[test]
    fn test_credential_from_env() {
        let key = resolve_credential_with(None, ANTHROPIC_API_KEY_ENV, |name| {
            (name == ANTHROPIC_API_KEY_ENV).then(|| "sk-test".to_string())
        });
        assert_eq!(key.unwrap(), "sk-test");
    }

    #[test]
    fn test_empty_explicit_falls_back_to_env() {
        let key = resolve_credential_with(Some(String::new()), MCP_API_KEY_ENV, |_| {
            Some("env-key".into())
        });
        assert_eq!(key.unwrap(), "env-key");
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        let err = resolve_credential_with(None, MCP_API_KEY_ENV, |_| None).unwrap_err();
        assert!(matches!(err, RepoCreatorError::Configuration(_)));
        assert!(err.to_string().contains("MCP_API_KEY"));
    }

    #[test]
    fn test_empty_env_credential_is_missing() {
        let err =
            resolve_credential_with(None, MCP_API_KEY_ENV, |_| Some(String::new())).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_verify_config_defaults() {
        let config = VerifyConfig::default();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.delay, Duration::from_secs(2));
    }

    #[test]
    fn test_timeout_from_secs() {
        assert_eq!(timeout_from_secs(0), None);
        assert_eq!(timeout_from_secs(30), Some(Duration::from_secs(30)));
    }
}
