//! API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository permissions of the authenticated user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

/// Repository info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

/// Commit status state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitStatusState {
    Pending,
    Success,
    Error,
    Failure,
}

/// Commit status request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitStatusRequest {
    pub state: CommitStatusState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Commit status as returned by GitHub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitStatus {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub state: Option<CommitStatusState>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Deployment status state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatusState {
    Error,
    Failure,
    Inactive,
    InProgress,
    Queued,
    Pending,
    Success,
}

impl DeploymentStatusState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatusState::Error => "error",
            DeploymentStatusState::Failure => "failure",
            DeploymentStatusState::Inactive => "inactive",
            DeploymentStatusState::InProgress => "in_progress",
            DeploymentStatusState::Queued => "queued",
            DeploymentStatusState::Pending => "pending",
            DeploymentStatusState::Success => "success",
        }
    }
}

impl std::fmt::Display for DeploymentStatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub environment: String,
    pub task: String,
    pub description: String,
    pub payload: serde_json::Value,
    pub transient_environment: bool,
    pub required_contexts: Vec<String>,
}

impl DeploymentRequest {
    /// A `deploy` task against `git_ref`, bypassing required status checks
    pub fn deploy(
        git_ref: impl Into<String>,
        environment: impl Into<String>,
        description: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            git_ref: git_ref.into(),
            environment: environment.into(),
            task: "deploy".to_string(),
            description: description.into(),
            payload,
            transient_environment: false,
            required_contexts: vec![],
        }
    }
}

/// Deployment status request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatusRequest {
    pub state: DeploymentStatusState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Account that created a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub id: u64,
}

/// Deployment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: u64,
    #[serde(default)]
    pub sha: String,
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub creator: Option<User>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Deployment status record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatus {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub state: Option<DeploymentStatusState>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub log_url: Option<String>,
}

/// Branch pointer of a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRef {
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub head: RepoRef,
    pub base: RepoRef,
}

/// Commit comment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitCommentRequest {
    pub body: String,
}

/// Commit comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitComment {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub body: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_request_renames_ref() {
        let request = DeploymentRequest::deploy(
            "abc123",
            "production",
            "TeamCity build starting",
            serde_json::json!({"buildIdAsString": "17"}),
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["ref"], "abc123");
        assert_eq!(value["task"], "deploy");
        assert_eq!(value["transient_environment"], false);
        assert_eq!(value["required_contexts"], serde_json::json!([]));
    }

    #[test]
    fn test_deployment_status_state_is_snake_case() {
        let value = serde_json::to_value(DeploymentStatusState::InProgress).unwrap();
        assert_eq!(value, "in_progress");
        assert_eq!(DeploymentStatusState::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_created_records_tolerate_sparse_responses() {
        let status: DeploymentStatus = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(status.id, 3);
        assert_eq!(status.state, None);

        let status: DeploymentStatus = serde_json::from_str(r#"{"state": "in_progress"}"#).unwrap();
        assert_eq!(status.state, Some(DeploymentStatusState::InProgress));

        let status: CommitStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status.state, None);

        let comment: CommitComment = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        assert!(comment.body.is_empty());
    }

    #[test]
    fn test_deployment_tolerates_missing_fields() {
        let deployment: Deployment =
            serde_json::from_str(r#"{"id": 7, "sha": "abc", "environment": "production"}"#).unwrap();
        assert_eq!(deployment.id, 7);
        assert!(deployment.payload.is_null());
        assert!(deployment.creator.is_none());
    }
}
