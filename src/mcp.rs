//! Direct REST variant: ask an MCP endpoint to run `create_repository`.

use std::time::Duration;

use serde::Serialize;

use crate::config::MCP_API_KEY_ENV;
use crate::error::RepoCreatorError;
use crate::repository::{CreationResult, RepositoryParams, RepositoryRequest, CREATE_REPOSITORY};

pub struct McpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct FunctionCall<'a> {
    function_name: &'a str,
    parameters: RepositoryParams,
}

impl McpClient {
    /// Fails with a configuration error when `api_key` is absent or empty.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RepoCreatorError> {
        let api_key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
            RepoCreatorError::Configuration(format!(
                "{} environment variable not set",
                MCP_API_KEY_ENV
            ))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/github/repositories", self.base_url)
    }

    /// Send a single creation call. No retry happens here.
    pub async fn create_repository(
        &self,
        request: &RepositoryRequest,
    ) -> Result<CreationResult, RepoCreatorError> {
        let url = self.endpoint();
        let payload = FunctionCall {
            function_name: CREATE_REPOSITORY,
            parameters: request.params(),
        };

        tracing::debug!(url = %url, repo = request.name(), "Sending MCP create_repository call");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "MCP endpoint rejected the request");
            return Err(RepoCreatorError::from_response(response).await);
        }

        let body = response.text().await?;
        let raw: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| RepoCreatorError::Parse(format!("Invalid JSON in MCP response: {}", e)))?;

        Ok(CreationResult::from_response(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> RepositoryRequest {
        RepositoryRequest::new("r", "u")
            .unwrap()
            .with_description("test repo")
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = McpClient::new(&mock_server.uri(), None, None).err().unwrap();
        assert!(matches!(err, RepoCreatorError::Configuration(_)));

        let err = McpClient::new(&mock_server.uri(), Some(String::new()), None)
            .err()
            .unwrap();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_endpoint_trims_trailing_slash() {
        let client = McpClient::new("https://mcp.test/", Some("k".into()), None).unwrap();
        assert_eq!(client.endpoint(), "https://mcp.test/github/repositories");
    }

    #[tokio::test]
    async fn test_create_repository_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/github/repositories"))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({
                "function_name": "create_repository",
                "parameters": {
                    "name": "r",
                    "description": "test repo",
                    "private": false,
                    "autoInit": true
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "name": "r",
                "html_url": "https://github.com/u/r",
                "owner": {"login": "u"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = McpClient::new(&mock_server.uri(), Some("test-key".into()), None).unwrap();
        let result = client.create_repository(&request()).await.unwrap();

        assert_eq!(result.url.as_deref(), Some("https://github.com/u/r"));
        assert_eq!(result.owner_login.as_deref(), Some("u"));
    }

    #[tokio::test]
    async fn test_create_repository_error_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/github/repositories"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"message": "name already exists"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = McpClient::new(&mock_server.uri(), Some("k".into()), None).unwrap();
        let err = client.create_repository(&request()).await.unwrap_err();

        match err {
            RepoCreatorError::Request {
                status, details, ..
            } => {
                assert_eq!(status, 422);
                assert_eq!(details, Some(json!({"message": "name already exists"})));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_repository_plain_text_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let client = McpClient::new(&mock_server.uri(), Some("k".into()), None).unwrap();
        let err = client.create_repository(&request()).await.unwrap_err();

        match err {
            RepoCreatorError::Request {
                status,
                details,
                text,
            } => {
                assert_eq!(status, 502);
                assert_eq!(details, None);
                assert_eq!(text, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_repository_invalid_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = McpClient::new(&mock_server.uri(), Some("k".into()), None).unwrap();
        let err = client.create_repository(&request()).await.unwrap_err();
        assert!(matches!(err, RepoCreatorError::Parse(_)));
    }
}
