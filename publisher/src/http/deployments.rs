//! Deployment API client

use github_client::{Deployment, DeploymentRequest, DeploymentStatus, DeploymentStatusRequest};

use crate::errors::PublisherError;
use crate::http::client::{HttpClient, ACCEPT_DEPLOYMENTS};

impl HttpClient {
    /// List deployments for a commit and environment
    pub async fn get_deployments(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        environment: &str,
    ) -> Result<Vec<Deployment>, PublisherError> {
        let path = format!("/repos/{}/{}/deployments", owner, repo);
        let query = [("sha", sha), ("environment", environment)];
        self.get(&path, &query, ACCEPT_DEPLOYMENTS).await
    }

    /// Create a deployment
    pub async fn create_deployment(
        &self,
        owner: &str,
        repo: &str,
        request: &DeploymentRequest,
    ) -> Result<Deployment, PublisherError> {
        let path = format!("/repos/{}/{}/deployments", owner, repo);
        self.post(&path, request, ACCEPT_DEPLOYMENTS).await
    }

    /// Append a status to a deployment
    pub async fn create_deployment_status(
        &self,
        owner: &str,
        repo: &str,
        deployment_id: u64,
        request: &DeploymentStatusRequest,
    ) -> Result<DeploymentStatus, PublisherError> {
        let path = format!("/repos/{}/{}/deployments/{}/statuses", owner, repo, deployment_id);
        self.post(&path, request, ACCEPT_DEPLOYMENTS).await
    }
}
