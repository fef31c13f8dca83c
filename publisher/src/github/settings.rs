//! GitHub publisher settings

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::constants::{GITHUB_PUBLISHER_ID, GITHUB_STATUS_PUBLISHER_ID, GIT_VCS_NAME};
use crate::errors::PublisherError;
use crate::events::Event;
use crate::github::deployments::GitHubDeploymentsPublisher;
use crate::github::params;
use crate::github::statuses::GitHubStatusPublisher;
use crate::github::updater::{repository_of, UpdateHandler};
use crate::host::{BuildConfiguration, BuildServer, VcsRoot};
use crate::publisher::problems::ProblemTracker;
use crate::publisher::settings::{InvalidProperty, PublisherSettings};
use crate::publisher::{Publisher, PublisherBase};
use crate::sync::locks::KeyedLocks;
use crate::workers::scheduler::StatusScheduler;

/// Collaborators shared by all GitHub publishers
pub struct GitHubServices {
    pub problems: Arc<ProblemTracker>,
    pub locks: Arc<KeyedLocks>,
    pub scheduler: Arc<StatusScheduler>,
    pub server: Arc<dyn BuildServer>,
    pub connection_timeout: Duration,
    pub test_connection_timeout: Duration,
    pub user_agent: String,
}

impl GitHubServices {
    fn publisher_base(
        &self,
        settings: Arc<dyn PublisherSettings>,
        build_type: &BuildConfiguration,
        build_feature_id: &str,
        params: &HashMap<String, String>,
    ) -> PublisherBase {
        PublisherBase::new(
            settings,
            build_type,
            build_feature_id,
            params,
            self.problems.clone(),
            self.locks.clone(),
        )
        .with_connection_timeout(self.connection_timeout)
    }

    async fn test_connection(
        &self,
        root: &VcsRoot,
        params: &HashMap<String, String>,
    ) -> Result<(), PublisherError> {
        let repository = repository_of(root)?;
        let handler = UpdateHandler::new(root, params, self.test_connection_timeout, &self.user_agent)?;
        handler
            .client()
            .test_connection(&repository.owner, &repository.name)
            .await
    }
}

/// Settings of the deployment status publisher
#[derive(Clone)]
pub struct GitHubDeploymentsSettings {
    services: Arc<GitHubServices>,
}

impl GitHubDeploymentsSettings {
    pub fn new(services: Arc<GitHubServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl PublisherSettings for GitHubDeploymentsSettings {
    fn id(&self) -> &str {
        GITHUB_PUBLISHER_ID
    }

    fn name(&self) -> &str {
        "GitHub"
    }

    fn default_parameters(&self) -> Option<HashMap<String, String>> {
        Some(params::default_parameters())
    }

    fn describe_parameters(&self, params: &HashMap<String, String>) -> String {
        params::describe("Post deployment status to GitHub", params)
    }

    fn validate_parameters(&self, params: &HashMap<String, String>) -> Vec<InvalidProperty> {
        params::validate(params)
    }

    fn create_publisher(
        &self,
        build_type: &BuildConfiguration,
        build_feature_id: &str,
        params: &HashMap<String, String>,
    ) -> Option<Arc<dyn Publisher>> {
        let base = self
            .services
            .publisher_base(Arc::new(self.clone()), build_type, build_feature_id, params);
        Some(Arc::new(GitHubDeploymentsPublisher::new(base, self.services.clone())))
    }

    fn is_publishing_for_vcs_root(&self, root: &VcsRoot) -> bool {
        root.vcs_name == GIT_VCS_NAME
    }

    fn is_event_supported(&self, event: Event) -> bool {
        matches!(
            event,
            Event::Starting | Event::Finished | Event::Interrupted | Event::MarkedAsSuccessful
        )
    }

    fn is_test_connection_supported(&self) -> bool {
        true
    }

    async fn test_connection(
        &self,
        _build_type: &BuildConfiguration,
        root: &VcsRoot,
        params: &HashMap<String, String>,
    ) -> Result<(), PublisherError> {
        self.services.test_connection(root, params).await
    }
}

/// Settings of the commit status publisher
#[derive(Clone)]
pub struct GitHubStatusSettings {
    services: Arc<GitHubServices>,
}

impl GitHubStatusSettings {
    pub fn new(services: Arc<GitHubServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl PublisherSettings for GitHubStatusSettings {
    fn id(&self) -> &str {
        GITHUB_STATUS_PUBLISHER_ID
    }

    fn name(&self) -> &str {
        "GitHub commit status"
    }

    fn default_parameters(&self) -> Option<HashMap<String, String>> {
        Some(params::default_parameters())
    }

    fn describe_parameters(&self, params: &HashMap<String, String>) -> String {
        params::describe("Post commit status to GitHub", params)
    }

    fn validate_parameters(&self, params: &HashMap<String, String>) -> Vec<InvalidProperty> {
        params::validate(params)
    }

    fn create_publisher(
        &self,
        build_type: &BuildConfiguration,
        build_feature_id: &str,
        params: &HashMap<String, String>,
    ) -> Option<Arc<dyn Publisher>> {
        let base = self
            .services
            .publisher_base(Arc::new(self.clone()), build_type, build_feature_id, params);
        Some(Arc::new(GitHubStatusPublisher::new(base, self.services.clone())))
    }

    fn is_publishing_for_vcs_root(&self, root: &VcsRoot) -> bool {
        root.vcs_name == GIT_VCS_NAME
    }

    fn is_event_supported(&self, event: Event) -> bool {
        matches!(
            event,
            Event::Started
                | Event::Finished
                | Event::Interrupted
                | Event::MarkedAsSuccessful
                | Event::Commented
        )
    }

    fn is_test_connection_supported(&self) -> bool {
        true
    }

    async fn test_connection(
        &self,
        _build_type: &BuildConfiguration,
        root: &VcsRoot,
        params: &HashMap<String, String>,
    ) -> Result<(), PublisherError> {
        self.services.test_connection(root, params).await
    }
}
