//! Shared GitHub update plumbing

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use github_client::{CommitStatusState, DeploymentStatusState};
use secrecy::SecretString;
use tracing::{info, warn};

use crate::constants::{GITHUB_AUTH_TYPE, GITHUB_CONTEXT, GITHUB_DEFAULT_CONTEXT, GITHUB_SERVER, GITHUB_TOKEN};
use crate::errors::PublisherError;
use crate::host::{BuildStatus, Revision, VcsRoot};
use crate::http::client::{ClientOptions, HttpClient};
use crate::http::pulls::is_pull_request_merge_branch;
use crate::repository::{parse_repository, Repository};

/// How the publisher authenticates against GitHub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationType {
    Token,
    /// Basic authentication, no longer accepted by GitHub
    Password,
}

impl AuthenticationType {
    /// Missing value means token authentication
    pub fn parse(value: Option<&str>) -> Result<Self, PublisherError> {
        match value.map(str::trim) {
            None | Some("") | Some("token") => Ok(AuthenticationType::Token),
            Some("password") => Ok(AuthenticationType::Password),
            Some(other) => Err(PublisherError::ConfigError(format!(
                "Failed to parse authentication type:{}",
                other
            ))),
        }
    }
}

/// Repository of a VCS root
pub fn repository_of(root: &VcsRoot) -> Result<Repository, PublisherError> {
    root.url()
        .and_then(|url| parse_repository(url, None))
        .ok_or_else(|| {
            PublisherError::ConfigError(format!(
                "Cannot parse repository URL from VCS root {}",
                root.name
            ))
        })
}

/// Deployment state for a finished build
pub fn deployment_state(status: BuildStatus) -> DeploymentStatusState {
    match status {
        BuildStatus::Normal => DeploymentStatusState::Success,
        BuildStatus::Failure => DeploymentStatusState::Failure,
        _ => DeploymentStatusState::Error,
    }
}

/// Commit status state for a finished build
pub fn commit_state(status: BuildStatus) -> CommitStatusState {
    match status {
        BuildStatus::Normal => CommitStatusState::Success,
        BuildStatus::Failure => CommitStatusState::Failure,
        _ => CommitStatusState::Error,
    }
}

/// Status text for a finished build
pub fn finished_text(status: BuildStatus) -> &'static str {
    if status.is_successful() {
        "TeamCity build finished"
    } else {
        "TeamCity build failed"
    }
}

/// Client and target repository for one publisher configuration
pub struct UpdateHandler {
    client: HttpClient,
    server_url: String,
    repository: Repository,
    context: String,
}

impl UpdateHandler {
    pub fn new(
        root: &VcsRoot,
        params: &HashMap<String, String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Arc<Self>, PublisherError> {
        let server_url = params
            .get(GITHUB_SERVER)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PublisherError::ConfigError("Failed to read GitHub URL from the feature settings".to_string())
            })?;

        let auth_type = AuthenticationType::parse(params.get(GITHUB_AUTH_TYPE).map(String::as_str))?;
        if auth_type != AuthenticationType::Token {
            return Err(PublisherError::ConfigError(format!(
                "Failed to parse authentication type:{:?}",
                auth_type
            )));
        }
        let token = params
            .get(GITHUB_TOKEN)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PublisherError::ConfigError("Personal Access Token must be specified".to_string()))?;

        let repository = repository_of(root)?;
        let options = ClientOptions {
            timeout,
            user_agent: user_agent.to_string(),
        };
        let client = HttpClient::new(server_url, SecretString::from(token.clone()), &options)?;

        let context = params
            .get(GITHUB_CONTEXT)
            .filter(|c| !c.is_empty())
            .cloned()
            .unwrap_or_else(|| GITHUB_DEFAULT_CONTEXT.to_string());

        Ok(Arc::new(Self {
            client,
            server_url: server_url.to_string(),
            repository,
            context,
        }))
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Context label, marked when the commit came from a PR merge branch
    pub fn status_context(&self, merge: bool) -> String {
        if merge {
            format!("{} - merge", self.context)
        } else {
            self.context.clone()
        }
    }

    pub fn description(&self, message: &str, merge: bool) -> String {
        format!("{} ({})", message, self.status_context(merge))
    }

    /// Commit to report on; the PR head for `refs/pull/<n>/merge` branches
    ///
    /// Falls back to the built commit when the pull request cannot be resolved.
    pub async fn resolve_commit_hash(&self, revision: &Revision, build_id: u64, status: &str) -> String {
        let Some(branch) = revision.vcs_branch.as_deref() else {
            return revision.version.clone();
        };
        if !is_pull_request_merge_branch(branch) {
            return revision.version.clone();
        }

        let owner = &self.repository.owner;
        let name = &self.repository.name;
        match self.client.find_pull_request_commit(owner, name, branch).await {
            Ok(Some(hash)) => {
                info!(
                    "Resolved GitHub change commit for {} to point to pull request head for hash: {}, newHash: {}, buildId: {}, status: {}",
                    branch, revision.version, hash, build_id, status
                );
                hash
            }
            Ok(None) => {
                warn!("Failed to find status update hash for {} for repository {}", branch, name);
                revision.version.clone()
            }
            Err(e) => {
                warn!(
                    "Failed to find status update hash for {} for repository {}: {}",
                    branch, name, e
                );
                revision.version.clone()
            }
        }
    }
}
