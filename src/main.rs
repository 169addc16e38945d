use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mcp_repo_creator::anthropic::AnthropicClient;
use mcp_repo_creator::config::{
    self, VerifyConfig, ANTHROPIC_API_KEY_ENV, DEFAULT_ANTHROPIC_BASE_URL,
    DEFAULT_ANTHROPIC_DESCRIPTION, DEFAULT_GITHUB_API_URL, DEFAULT_MAX_TOKENS,
    DEFAULT_MCP_BASE_URL, DEFAULT_MCP_DESCRIPTION, DEFAULT_MODEL, DEFAULT_OWNER,
    DEFAULT_REPO_NAME, MCP_API_KEY_ENV,
};
use mcp_repo_creator::error::RepoCreatorError;
use mcp_repo_creator::mcp::McpClient;
use mcp_repo_creator::repository::RepositoryRequest;
use mcp_repo_creator::verify::{github_client, Verifier};
use mcp_repo_creator::workflow::{Requester, Workflow};
use tracing_subscriber::EnvFilter;

/// Create a GitHub repository through an MCP endpoint or an LLM tool call,
/// then poll GitHub until it shows up
#[derive(Parser)]
#[command(name = "mcp-repo-creator", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a create_repository call straight to an MCP REST endpoint
    Mcp {
        #[command(flatten)]
        repo: RepoArgs,

        /// Repository description
        #[arg(long, default_value = DEFAULT_MCP_DESCRIPTION)]
        description: String,

        /// MCP API base URL
        #[arg(long, default_value = DEFAULT_MCP_BASE_URL)]
        base_url: String,

        /// MCP API key.
        /// Can also be set via MCP_API_KEY environment variable.
        #[arg(long)]
        api_key: Option<String>,

        /// Read the MCP API key from this environment variable
        #[arg(long = "api-key-env", default_value = MCP_API_KEY_ENV)]
        api_key_env: String,

        #[command(flatten)]
        verify: VerifyArgs,
    },

    /// Ask the model to call a create_repository tool and report its input
    Anthropic {
        #[command(flatten)]
        repo: RepoArgs,

        /// Repository description
        #[arg(long, default_value = DEFAULT_ANTHROPIC_DESCRIPTION)]
        description: String,

        /// Messages API base URL
        #[arg(long, default_value = DEFAULT_ANTHROPIC_BASE_URL)]
        base_url: String,

        /// Anthropic API key.
        /// Can also be set via ANTHROPIC_API_KEY environment variable.
        #[arg(long)]
        api_key: Option<String>,

        /// Read the Anthropic API key from this environment variable
        #[arg(long = "api-key-env", default_value = ANTHROPIC_API_KEY_ENV)]
        api_key_env: String,

        /// Model identifier
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,

        /// Maximum tokens in the model response
        #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
        max_tokens: u32,

        #[command(flatten)]
        verify: VerifyArgs,
    },
}

#[derive(Args)]
struct RepoArgs {
    /// Repository name
    #[arg(long, default_value = DEFAULT_REPO_NAME)]
    name: String,

    /// Repository owner (GitHub user)
    #[arg(long, default_value = DEFAULT_OWNER)]
    owner: String,

    /// Create a private repository
    #[arg(long)]
    private: bool,

    /// Do not initialize the repository with a README
    #[arg(long)]
    no_auto_init: bool,
}

#[derive(Args)]
struct VerifyArgs {
    /// GitHub API base URL used for verification
    #[arg(long, default_value = DEFAULT_GITHUB_API_URL)]
    github_api_url: String,

    /// Verification attempts before giving up
    #[arg(long, default_value = "5")]
    max_retries: u32,

    /// Seconds between verification attempts
    #[arg(long, default_value = "2")]
    delay_secs: u64,

    /// Seconds to wait after creation before verifying
    #[arg(long, default_value = "3")]
    settle_secs: u64,

    /// Per-request timeout in seconds (0 disables it)
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
}

impl RepoArgs {
    fn into_request(self, description: String) -> Result<RepositoryRequest, RepoCreatorError> {
        Ok(RepositoryRequest::new(self.name, self.owner)?
            .with_description(description)
            .with_private(self.private)
            .with_auto_init(!self.no_auto_init))
    }
}

async fn run(cli: Cli) -> Result<ExitCode, RepoCreatorError> {
    let (requester, request, verify) = match cli.command {
        Command::Mcp {
            repo,
            description,
            base_url,
            api_key,
            api_key_env,
            verify,
        } => {
            let request = repo.into_request(description)?;
            let key = config::resolve_credential(api_key, &api_key_env)?;
            let timeout = config::timeout_from_secs(verify.timeout_secs);
            let client = McpClient::new(&base_url, Some(key), timeout)?;
            (Requester::Mcp(client), request, verify)
        }
        Command::Anthropic {
            repo,
            description,
            base_url,
            api_key,
            api_key_env,
            model,
            max_tokens,
            verify,
        } => {
            let request = repo.into_request(description)?;
            let key = config::resolve_credential(api_key, &api_key_env)?;
            let timeout = config::timeout_from_secs(verify.timeout_secs);
            let client = AnthropicClient::new(&base_url, Some(key), timeout)?
                .with_model(model)
                .with_max_tokens(max_tokens);
            (Requester::Model(client), request, verify)
        }
    };

    let github = github_client(
        &verify.github_api_url,
        config::timeout_from_secs(verify.timeout_secs),
    )?;
    let verifier = Verifier::new(
        github,
        VerifyConfig {
            max_retries: verify.max_retries,
            delay: Duration::from_secs(verify.delay_secs),
        },
    );

    tracing::info!(
        repo = request.name(),
        owner = request.owner(),
        max_retries = verify.max_retries,
        "Starting repository creation"
    );

    let workflow = Workflow::new(verifier, Duration::from_secs(verify.settle_secs));
    let outcome = workflow
        .run(&requester, &request, &mut std::io::stdout())
        .await?;

    Ok(ExitCode::from(outcome.exit_code()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => Ok(code),
        Err(err) if err.is_fatal() => {
            eprintln!("{}", err);
            Ok(ExitCode::from(err.exit_code()))
        }
        Err(err) => Err(anyhow::Error::new(err).context("Repository creation run failed")),
    }
}
