//! The create-then-verify run shared by both subcommands, and the console
//! reporting that turns failures into printed diagnostics.

use std::io::Write;
use std::time::Duration;

use crate::anthropic::AnthropicClient;
use crate::error::RepoCreatorError;
use crate::mcp::McpClient;
use crate::repository::{CreationResult, RepositoryInfo, RepositoryIntent, RepositoryRequest};
use crate::verify::{VerificationOutcome, Verifier};

pub enum Requester {
    Mcp(McpClient),
    Model(AnthropicClient),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    CreationFailed,
    Verified { info: RepositoryInfo, attempts: u32 },
    Unverified { attempts: u32 },
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Verified { .. } => 0,
            RunOutcome::CreationFailed => 1,
            RunOutcome::Unverified { attempts } => RepoCreatorError::VerificationTimeout {
                attempts: *attempts,
            }
            .exit_code(),
        }
    }
}

/// Print a creation failure, including the server's error body when there
/// is one.
fn report_creation_error<W: Write>(out: &mut W, err: &RepoCreatorError) -> std::io::Result<()> {
    writeln!(out, "Error creating repository: {}", err)?;
    if let RepoCreatorError::Request {
        status,
        details,
        text,
    } = err
    {
        match details {
            Some(details) => {
                let pretty =
                    serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
                writeln!(out, "Error details: {}", pretty)?;
            }
            None => {
                writeln!(out, "Status code: {}", status)?;
                writeln!(out, "Response text: {}", text)?;
            }
        }
    }
    Ok(())
}

/// Non-fatal errors are reported and become `None`; configuration and
/// output errors are returned.
fn swallow<T>(err: RepoCreatorError) -> Result<Option<T>, RepoCreatorError> {
    if err.is_fatal() || matches!(err, RepoCreatorError::Io(_)) {
        Err(err)
    } else {
        Ok(None)
    }
}

pub async fn submit_via_mcp<W: Write>(
    client: &McpClient,
    request: &RepositoryRequest,
    out: &mut W,
) -> Result<Option<CreationResult>, RepoCreatorError> {
    match client.create_repository(request).await {
        Ok(result) => {
            writeln!(out, "Repository created successfully!")?;
            writeln!(out, "Repository URL: {}", result.url_or_placeholder())?;
            Ok(Some(result))
        }
        Err(err) => {
            tracing::error!(error = %err, "Repository creation failed");
            report_creation_error(out, &err)?;
            swallow(err)
        }
    }
}

pub async fn submit_via_model<W: Write>(
    client: &AnthropicClient,
    request: &RepositoryRequest,
    out: &mut W,
) -> Result<Option<RepositoryIntent>, RepoCreatorError> {
    match client.request_repository(request).await {
        Ok(intent) => {
            let params = &intent.params;
            writeln!(out, "Repository creation request submitted successfully:")?;
            writeln!(out, "- Name: {}", params.name)?;
            writeln!(
                out,
                "- Description: {}",
                params.description.as_deref().unwrap_or("None")
            )?;
            writeln!(
                out,
                "- Private: {}",
                params.private.map(|p| p.to_string()).as_deref().unwrap_or("None")
            )?;
            Ok(Some(intent))
        }
        Err(err) => {
            tracing::error!(error = %err, model = client.model(), "Repository creation request failed");
            match &err {
                RepoCreatorError::NoToolUse => writeln!(out, "{}", err)?,
                RepoCreatorError::Parse(_) => {
                    writeln!(out, "Error parsing repository details: {}", err)?
                }
                _ => report_creation_error(out, &err)?,
            }
            swallow(err)
        }
    }
}

pub struct Workflow {
    verifier: Verifier,
    settle: Duration,
}

impl Workflow {
    /// `settle` is the pause between a successful creation and the first
    /// verification attempt.
    pub fn new(verifier: Verifier, settle: Duration) -> Self {
        Self { verifier, settle }
    }

    pub async fn run<W: Write>(
        &self,
        requester: &Requester,
        request: &RepositoryRequest,
        out: &mut W,
    ) -> Result<RunOutcome, RepoCreatorError> {
        let created = match requester {
            Requester::Mcp(client) => {
                writeln!(
                    out,
                    "Creating repository '{}' for user '{}'...",
                    request.name(),
                    request.owner()
                )?;
                submit_via_mcp(client, request, out).await?.is_some()
            }
            Requester::Model(client) => {
                writeln!(
                    out,
                    "Creating repository '{}' for user '{}' using Anthropic MCP client...",
                    request.name(),
                    request.owner()
                )?;
                submit_via_model(client, request, out).await?.is_some()
            }
        };

        if !created {
            let what = match requester {
                Requester::Mcp(_) => "Repository creation",
                Requester::Model(_) => "Repository creation request",
            };
            writeln!(out, "{} failed. Please check the error messages above.", what)?;
            return Ok(RunOutcome::CreationFailed);
        }

        tokio::time::sleep(self.settle).await;

        let outcome = self
            .verifier
            .verify(request.owner(), request.name(), out)
            .await?;

        Ok(match outcome {
            VerificationOutcome::Confirmed { info, attempts } => {
                RunOutcome::Verified { info, attempts }
            }
            VerificationOutcome::Unconfirmed { attempts } => {
                tracing::warn!(
                    error = %RepoCreatorError::VerificationTimeout { attempts },
                    owner = request.owner(),
                    repo = request.name(),
                    "Repository not visible"
                );
                RunOutcome::Unverified { attempts }
            }
        })
    }
}
