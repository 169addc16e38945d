//! Model-mediated variant: hand the model a `create_repository` tool and
//! read back the tool call it makes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ANTHROPIC_API_KEY_ENV, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::error::RepoCreatorError;
use crate::repository::{RepositoryIntent, RepositoryParams, RepositoryRequest, CREATE_REPOSITORY};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You are a helpful assistant that will create a GitHub repository for the user.
Use the provided repository name, username, and other parameters to create the repository.
IMPORTANT: Do not include any explanations or thoughts in your response.
Only execute the repository creation and return the raw result.";

pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    tools: Vec<ToolDefinition>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

/// The tool declaration sent with every request. Its schema is derived from
/// [`RepositoryParams`], the same type the tool input is parsed into.
pub fn create_repository_tool() -> ToolDefinition {
    let schema = schemars::schema_for!(RepositoryParams);
    let mut input_schema =
        serde_json::to_value(&schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(object) = input_schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
        object.remove("description");
    }
    strip_null_types(&mut input_schema);

    ToolDefinition {
        name: CREATE_REPOSITORY.to_string(),
        description: "Create a new GitHub repository in your account".to_string(),
        input_schema,
    }
}

/// Optional fields are optional by absence from `required`; the model is
/// offered plain `boolean`/`string` types rather than `[T, "null"]`.
fn strip_null_types(schema: &mut Value) {
    let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) else {
        return;
    };
    for property in properties.values_mut() {
        let single = match property.get_mut("type") {
            Some(Value::Array(types)) => {
                types.retain(|t| *t != "null");
                (types.len() == 1).then(|| types[0].clone())
            }
            _ => None,
        };
        if let Some(single) = single {
            property["type"] = single;
        }

        let Some(object) = property.as_object_mut() else {
            continue;
        };
        let branch = match object.get("anyOf") {
            Some(Value::Array(branches)) => {
                let mut rest = branches.iter().filter(|b| b["type"] != "null");
                match (rest.next(), rest.next()) {
                    (Some(only), None) => only.as_object().cloned(),
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(branch) = branch {
            object.remove("anyOf");
            for (key, value) in branch {
                object.entry(key).or_insert(value);
            }
        }
    }
}

pub fn user_prompt(request: &RepositoryRequest) -> String {
    format!(
        "Create a GitHub repository with these parameters:
- Repository name: {}
- Username: {}
- Description: {}
- Private: {}
- Initialize with README: {}",
        request.name(),
        request.owner(),
        request.description(),
        request.private(),
        request.auto_init(),
    )
}

/// Find the `create_repository` call among the response blocks and parse
/// its input.
pub fn extract_intent(response: &MessagesResponse) -> Result<RepositoryIntent, RepoCreatorError> {
    let input = response
        .content
        .iter()
        .find_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } if name == CREATE_REPOSITORY => Some(input),
            _ => None,
        })
        .ok_or(RepoCreatorError::NoToolUse)?;

    parse_tool_input(input)
}

/// Tool input normally arrives as an object; a string holding a JSON
/// object is accepted too.
fn parse_tool_input(input: &Value) -> Result<RepositoryIntent, RepoCreatorError> {
    let raw = match input {
        Value::Object(map) => map.clone(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(RepoCreatorError::Parse(
                    "tool input is not a JSON object".to_string(),
                ))
            }
            Err(e) => {
                return Err(RepoCreatorError::Parse(format!(
                    "invalid JSON in tool input: {}",
                    e
                )))
            }
        },
        _ => {
            return Err(RepoCreatorError::Parse(
                "tool input is not a JSON object".to_string(),
            ))
        }
    };

    let params: RepositoryParams = serde_json::from_value(Value::Object(raw.clone()))
        .map_err(|e| RepoCreatorError::Parse(format!("unexpected tool input: {}", e)))?;

    Ok(RepositoryIntent { params, raw })
}

impl AnthropicClient {
    /// Fails with a configuration error when `api_key` is absent or empty.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RepoCreatorError> {
        let api_key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
            RepoCreatorError::Configuration(format!(
                "{} environment variable not set",
                ANTHROPIC_API_KEY_ENV
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
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    /// Send one messages request and return the model's creation intent.
    pub async fn request_repository(
        &self,
        request: &RepositoryRequest,
    ) -> Result<RepositoryIntent, RepoCreatorError> {
        let url = self.endpoint();
        let body = MessagesRequest {
            model: &self.model,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: user_prompt(request),
            }],
            max_tokens: self.max_tokens,
            tools: vec![create_repository_tool()],
        };

        tracing::debug!(url = %url, model = %self.model, "Sending messages request");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Messages API rejected the request");
            return Err(RepoCreatorError::from_response(response).await);
        }

        let text = response.text().await?;
        let messages: MessagesResponse = serde_json::from_str(&text).map_err(|e| {
            RepoCreatorError::Parse(format!("Invalid messages response: {}", e))
        })?;

        tracing::debug!(
            id = messages.id.as_deref().unwrap_or("unknown"),
            stop_reason = messages.stop_reason.as_deref().unwrap_or("unknown"),
            blocks = messages.content.len(),
            "Received model response"
        );

        extract_intent(&messages)
    }
}
