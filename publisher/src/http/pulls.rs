//! Pull request API

use std::sync::LazyLock;

use github_client::PullRequest;
use regex::Regex;
use tracing::debug;

use crate::errors::PublisherError;
use crate::http::client::{HttpClient, ACCEPT_JSON};

static PULL_REQUEST_BRANCH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^/?refs/pull/(\d+)/(.*)$").ok());

/// Pull request number and ref kind (`head` or `merge`) of a PR branch
fn pull_request_ref(branch: &str) -> Option<(&str, &str)> {
    let caps = PULL_REQUEST_BRANCH.as_ref()?.captures(branch)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// `true` for `refs/pull/<n>/merge`
pub fn is_pull_request_merge_branch(branch: &str) -> bool {
    matches!(pull_request_ref(branch), Some((_, "merge")))
}

impl HttpClient {
    /// Get a pull request
    pub async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: &str,
    ) -> Result<PullRequest, PublisherError> {
        let path = format!("/repos/{}/{}/pulls/{}", owner, repo, number);
        self.get(&path, &[], ACCEPT_JSON).await
    }

    /// Head commit of the pull request a PR branch points to
    pub async fn find_pull_request_commit(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Option<String>, PublisherError> {
        let Some((number, _)) = pull_request_ref(branch) else {
            debug!("Branch {} for repo {} does not look like pull request", branch, repo);
            return Ok(None);
        };
        let pull_request = self.get_pull_request(owner, repo, number).await?;
        Ok(Some(pull_request.head.sha).filter(|sha| !sha.is_empty()))
    }
}
