#[derive(Debug, thiserror::Error)]
pub enum RepoCreatorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP {status}: {text}")]
    Request {
        status: u16,
        /// Decoded JSON error body, when the server sent one.
        details: Option<serde_json::Value>,
        text: String,
    },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API error: {}", first_line(.0))]
    GitHub(#[from] octocrab::Error),

    #[error("{0}")]
    Parse(String),

    #[error("No tool use found in response")]
    NoToolUse,

    #[error("Repository verification failed after {attempts} attempts")]
    VerificationTimeout { attempts: u32 },

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Octocrab appends a captured backtrace to its display output; keep the
/// message only.
fn first_line(err: &octocrab::Error) -> String {
    err.to_string()
        .lines()
        .next()
        .unwrap_or_default()
        .trim_end()
        .to_string()
}

impl RepoCreatorError {
    /// Build a `Request` error from a non-2xx response, keeping the body
    /// as JSON when it decodes.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let details = serde_json::from_str::<serde_json::Value>(&text).ok();
        RepoCreatorError::Request {
            status,
            details,
            text,
        }
    }

    /// Only a configuration problem is allowed to stop the process before
    /// any work is attempted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RepoCreatorError::Configuration(_))
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            RepoCreatorError::Configuration(_) => 2,
            RepoCreatorError::VerificationTimeout { .. } => 3,
            RepoCreatorError::Request { .. }
            | RepoCreatorError::Transport(_)
            | RepoCreatorError::GitHub(_)
            | RepoCreatorError::Parse(_)
            | RepoCreatorError::NoToolUse
            | RepoCreatorError::Io(_) => 1,
        }
    }
}
