//! Poll the public GitHub API until a repository shows up.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use octocrab::service::middleware::retry::RetryConfig;

use crate::config::VerifyConfig;
use crate::error::RepoCreatorError;
use crate::repository::{validate_github_name, RepositoryInfo};

#[derive(Clone)]
pub struct Verifier {
    github: Arc<octocrab::Octocrab>,
    config: VerifyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Confirmed { info: RepositoryInfo, attempts: u32 },
    Unconfirmed { attempts: u32 },
}

impl VerificationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, VerificationOutcome::Confirmed { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            VerificationOutcome::Confirmed { attempts, .. }
            | VerificationOutcome::Unconfirmed { attempts } => *attempts,
        }
    }
}

/// Result of one lookup that reached the server.
enum Lookup {
    Found(RepositoryInfo),
    Status(u16),
}

/// Unauthenticated GitHub client for `base_uri`.
///
/// Octocrab's own retry layer is turned off so every lookup is exactly one
/// HTTP request and the verifier alone decides how many attempts are made.
pub fn github_client(
    base_uri: &str,
    timeout: Option<Duration>,
) -> Result<octocrab::Octocrab, RepoCreatorError> {
    let github = octocrab::OctocrabBuilder::new()
        .base_uri(base_uri)?
        .add_retry_config(RetryConfig::None)
        .set_connect_timeout(timeout)
        .set_read_timeout(timeout)
        .build()?;
    Ok(github)
}

fn seconds(delay: Duration) -> String {
    if delay.subsec_nanos() == 0 {
        delay.as_secs().to_string()
    } else {
        format!("{:.1}", delay.as_secs_f64())
    }
}

impl Verifier {
    pub fn new(github: octocrab::Octocrab, config: VerifyConfig) -> Self {
        Self {
            github: Arc::new(github),
            config,
        }
    }

    /// The status is checked before the body is read, so a non-200 answer
    /// is a `Status` whatever its body holds.
    async fn fetch(&self, owner: &str, name: &str) -> Result<Lookup, RepoCreatorError> {
        let route = format!("/repos/{}/{}", owner, name);
        let response = self.github._get(route).await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Ok(Lookup::Status(status));
        }

        let body = self.github.body_to_string(response).await?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| RepoCreatorError::Parse(format!("Invalid repository JSON: {}", e)))?;
        RepositoryInfo::from_value(value).map(Lookup::Found)
    }

    /// Look the repository up at most `max_retries` times, `delay` apart.
    /// The first successful lookup ends the loop.
    ///
    /// Progress lines go to `out`. Only a failure to write them is returned
    /// as an error; running out of attempts is an `Unconfirmed` outcome.
    pub async fn verify<W: Write>(
        &self,
        owner: &str,
        name: &str,
        out: &mut W,
    ) -> Result<VerificationOutcome, RepoCreatorError> {
        validate_github_name(owner, "owner")?;
        validate_github_name(name, "repository name")?;

        let max = self.config.max_retries;
        let delay = self.config.delay;

        for attempt in 0..max {
            let number = attempt + 1;
            let last = number == max;

            match self.fetch(owner, name).await {
                Ok(Lookup::Found(info)) => {
                    tracing::info!(owner, name, attempt = number, "Repository confirmed");
                    writeln!(out, "Repository verification successful!")?;
                    writeln!(out, "Owner: {}", info.owner.login)?;
                    writeln!(out, "Repo: {}", info.name)?;
                    writeln!(out, "URL: {}", info.html_url)?;
                    return Ok(VerificationOutcome::Confirmed {
                        info,
                        attempts: number,
                    });
                }
                Ok(Lookup::Status(status)) => {
                    tracing::debug!(owner, name, status, attempt = number, "Repository lookup failed");
                    let what = if status == 404 {
                        "Repository not found".to_string()
                    } else {
                        format!("Repository lookup returned HTTP {}", status)
                    };
                    if last {
                        writeln!(out, "{} (attempt {}/{})", what, number, max)?;
                    } else {
                        writeln!(
                            out,
                            "{} (attempt {}/{}), retrying in {} seconds...",
                            what,
                            number,
                            max,
                            seconds(delay)
                        )?;
                    }
                }
                Err(e) => {
                    tracing::warn!(owner, name, attempt = number, error = %e, "Repository lookup errored");
                    writeln!(out, "Error verifying repository: {}", e)?;
                }
            }

            if !last {
                tokio::time::sleep(delay).await;
            }
        }

        writeln!(out, "Repository verification failed after multiple attempts.")?;
        Ok(VerificationOutcome::Unconfirmed { attempts: max })
    }
}
