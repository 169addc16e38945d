use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::RepoCreatorError;

/// Function/tool name used by both creation paths.
pub const CREATE_REPOSITORY: &str = "create_repository";

/// What to create: built once from configuration and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRequest {
    name: String,
    owner: String,
    description: String,
    private: bool,
    auto_init: bool,
}

impl RepositoryRequest {
    /// Public, auto-initialized repository with an empty description.
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Result<Self, RepoCreatorError> {
        let name = name.into();
        let owner = owner.into();
        validate_github_name(&name, "repository name")?;
        validate_github_name(&owner, "owner")?;
        Ok(Self {
            name,
            owner,
            description: String::new(),
            private: false,
            auto_init: true,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn with_auto_init(mut self, auto_init: bool) -> Self {
        self.auto_init = auto_init;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn private(&self) -> bool {
        self.private
    }

    pub fn auto_init(&self) -> bool {
        self.auto_init
    }

    /// Creation parameters as sent to the MCP endpoint.
    pub fn params(&self) -> RepositoryParams {
        RepositoryParams {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            private: Some(self.private),
            auto_init: Some(self.auto_init),
        }
    }
}

/// Reject names that are empty or would escape a single URL path segment.
pub(crate) fn validate_github_name(name: &str, field: &str) -> Result<(), RepoCreatorError> {
    if name.is_empty() {
        return Err(RepoCreatorError::Configuration(format!(
            "{} must not be empty",
            field
        )));
    }
    for ch in ['/', '?', '#', '%', '\0', ' ', '\n', '\t'] {
        if name.contains(ch) {
            return Err(RepoCreatorError::Configuration(format!(
                "{} contains invalid character '{}'",
                field,
                ch.escape_default()
            )));
        }
    }
    Ok(())
}

// Parameters of the `create_repository` function: the MCP payload, the
// tool schema offered to the model, and the tool input it sends back.
// Kept as a plain comment so it stays out of the generated schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RepositoryParams {
    #[schemars(description = "Repository name")]
    pub name: String,

    #[schemars(description = "Repository description")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[schemars(description = "Whether the repository should be private")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[schemars(description = "Initialize with README.md")]
    #[serde(default, rename = "autoInit", skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,
}

/// Outcome of a successful MCP creation call.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationResult {
    pub raw: serde_json::Value,
    pub url: Option<String>,
    pub name: Option<String>,
    pub owner_login: Option<String>,
}

impl CreationResult {
    pub const URL_PLACEHOLDER: &'static str = "URL not available";

    pub fn from_response(raw: serde_json::Value) -> Self {
        let text = |value: Option<&serde_json::Value>| {
            value.and_then(|v| v.as_str()).map(String::from)
        };
        Self {
            url: text(raw.get("html_url")),
            name: text(raw.get("name")),
            owner_login: text(raw.get("owner").and_then(|o| o.get("login"))),
            raw,
        }
    }

    pub fn url_or_placeholder(&self) -> &str {
        self.url.as_deref().unwrap_or(Self::URL_PLACEHOLDER)
    }
}

/// Creation intent elicited from the model through a tool call. Nothing
/// is created on GitHub by producing one.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryIntent {
    pub params: RepositoryParams,
    pub raw: serde_json::Map<String, serde_json::Value>,
}

/// The fields of `GET /repos/{owner}/{repo}` the verifier reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub html_url: String,
    pub owner: OwnerInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnerInfo {
    pub login: String,
}

impl RepositoryInfo {
    pub fn from_value(value: serde_json::Value) -> Result<Self, RepoCreatorError> {
        serde_json::from_value(value)
            .map_err(|e| RepoCreatorError::Parse(format!("Unexpected repository body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request = RepositoryRequest::new("repo", "user").unwrap();
        assert_eq!(request.name(), "repo");
        assert_eq!(request.owner(), "user");
        assert_eq!(request.description(), "");
        assert!(!request.private());
        assert!(request.auto_init());
    }

    #[test]
    fn test_request_builders() {
        let request = RepositoryRequest::new("repo", "user")
            .unwrap()
            .with_description("desc")
            .with_private(true)
            .with_auto_init(false);
        assert_eq!(request.description(), "desc");
        assert!(request.private());
        assert!(!request.auto_init());
    }

    #[test]
    fn test_request_rejects_empty_fields() {
        assert!(RepositoryRequest::new("", "user").unwrap_err().is_fatal());
        assert!(RepositoryRequest::new("repo", "").unwrap_err().is_fatal());
    }

    #[test]
    fn test_request_rejects_path_characters() {
        assert!(RepositoryRequest::new("owner/repo", "user").is_err());
        assert!(RepositoryRequest::new("repo", "../etc").is_err());
        assert!(RepositoryRequest::new("repo?x=1", "user").is_err());
        assert!(RepositoryRequest::new("my repo", "user").is_err());
        assert!(RepositoryRequest::new("repo.name", "user_name").is_ok());
    }

    #[test]
    fn test_params_wire_names() {
        let params = RepositoryRequest::new("repo", "user")
            .unwrap()
            .with_description("d")
            .params();
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"name": "repo", "description": "d", "private": false, "autoInit": true})
        );
    }

    #[test]
    fn test_params_only_name_required() {
        let params: RepositoryParams = serde_json::from_value(json!({"name": "r"})).unwrap();
        assert_eq!(params.name, "r");
        assert_eq!(params.private, None);
        assert!(serde_json::from_value::<RepositoryParams>(json!({"private": true})).is_err());
    }

    #[test]
    fn test_creation_result_fields() {
        let result = CreationResult::from_response(json!({
            "html_url": "https://github.com/u/r",
            "name": "r",
            "owner": {"login": "u"}
        }));
        assert_eq!(result.url.as_deref(), Some("https://github.com/u/r"));
        assert_eq!(result.url_or_placeholder(), "https://github.com/u/r");
        assert_eq!(result.name.as_deref(), Some("r"));
        assert_eq!(result.owner_login.as_deref(), Some("u"));
    }

    #[test]
    fn test_creation_result_without_url() {
        let result = CreationResult::from_response(json!({"status": "queued"}));
        assert_eq!(result.url, None);
        assert_eq!(result.url_or_placeholder(), "URL not available");
    }

    #[test]
    fn test_repository_info_from_value() {
        let info = RepositoryInfo::from_value(json!({
            "id": 1,
            "name": "r",
            "html_url": "https://github.com/u/r",
            "owner": {"login": "u", "id": 2}
        }))
        .unwrap();
        assert_eq!(info.owner.login, "u");
        assert_eq!(info.name, "r");
    }

    #[test]
    fn test_repository_info_missing_owner() {
        let err = RepositoryInfo::from_value(json!({"name": "r", "html_url": "x"})).unwrap_err();
        assert!(matches!(err, RepoCreatorError::Parse(_)));
    }
}
