//! Commit status API

use github_client::{CommitStatus, CommitStatusRequest};

use crate::errors::PublisherError;
use crate::http::client::{HttpClient, ACCEPT_JSON};

impl HttpClient {
    /// Create a commit status for `sha`
    pub async fn set_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &CommitStatusRequest,
    ) -> Result<CommitStatus, PublisherError> {
        let path = format!("/repos/{}/{}/statuses/{}", owner, repo, sha);
        self.post(&path, status, ACCEPT_JSON).await
    }
}
