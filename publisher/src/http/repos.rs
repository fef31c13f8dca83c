//! Repository API

use github_client::Repository;
use tracing::debug;

use crate::errors::PublisherError;
use crate::http::client::{HttpClient, ACCEPT_JSON};

impl HttpClient {
    /// Get repository information
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, PublisherError> {
        let path = format!("/repos/{}/{}", owner, repo);
        self.get(&path, &[], ACCEPT_JSON).await
    }

    /// Check that the repository exists and the token can push to it
    pub async fn test_connection(&self, owner: &str, repo: &str) -> Result<(), PublisherError> {
        let info = match self.get_repository(owner, repo).await {
            Ok(info) => info,
            Err(e) => {
                debug!("Repository lookup for {}/{} failed: {}", owner, repo, e);
                return Err(PublisherError::ConnectionError(format!(
                    "Error while retrieving {}/{} repository information",
                    owner, repo
                )));
            }
        };

        let Some(permissions) = info.permissions else {
            return Err(PublisherError::ConnectionError(format!(
                "Repository {}/{} is inaccessible",
                owner, repo
            )));
        };
        if info.name.is_empty() {
            return Err(PublisherError::ConnectionError(format!(
                "Repository {}/{} is inaccessible",
                owner, repo
            )));
        }
        if !permissions.push {
            return Err(PublisherError::ConnectionError(format!(
                "There is no push access to the repository {}/{}",
                owner, repo
            )));
        }
        Ok(())
    }
}
