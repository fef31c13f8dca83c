//! Commit comment API

use github_client::CommitCommentRequest;
use reqwest::StatusCode;

use crate::errors::PublisherError;
use crate::http::client::{HttpClient, ACCEPT_JSON};

impl HttpClient {
    /// Comment on a commit
    pub async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        body: &str,
    ) -> Result<(), PublisherError> {
        let path = format!("/repos/{}/{}/commits/{}/comments", owner, repo, sha);
        let request = CommitCommentRequest {
            body: body.to_string(),
        };
        let (status, text) = self.post_raw(&path, &request, ACCEPT_JSON).await?;
        if status != StatusCode::CREATED {
            return Err(PublisherError::api_plain(status, text));
        }
        Ok(())
    }
}
