//! GitHub deployment status publisher
//!
//! A deployment is created while the build is starting (when the feature asks
//! for it) and every later lifecycle event appends a deployment status. The
//! deployment for a status update is found through the build's own shared
//! parameter, then the build chain, then GitHub itself.

use std::sync::Arc;

use async_trait::async_trait;
use github_client::{Deployment, DeploymentRequest, DeploymentStatusRequest, DeploymentStatusState};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::constants::{
    BUILD_ID_KEY, DEPLOYMENT_ID_PARAM_KEY, GITHUB_PUBLISHER_ID, GIT_VCS_NAME, TARGET_ENVIRONMENT_DEFAULT,
    TARGET_ENVIRONMENT_PARAM,
};
use crate::errors::PublisherError;
use crate::github::params;
use crate::github::settings::GitHubServices;
use crate::github::updater::{deployment_state, finished_text, UpdateHandler};
use crate::host::{Build, Revision};
use crate::publisher::{Publisher, PublisherBase};

/// Payload stored on created deployments
pub fn deployment_payload(build_id: u64) -> serde_json::Value {
    json!({ BUILD_ID_KEY: build_id.to_string() })
}

/// `true` if the deployment payload names this build
///
/// GitHub returns the payload either as an object or as a JSON-encoded string.
pub fn has_build_id(deployment: &Deployment, build_id: u64) -> bool {
    let expected = build_id.to_string();
    let matches = |payload: &serde_json::Value| {
        payload.get(BUILD_ID_KEY).and_then(|v| v.as_str()) == Some(expected.as_str())
    };
    match &deployment.payload {
        serde_json::Value::String(encoded) => serde_json::from_str::<serde_json::Value>(encoded)
            .map(|payload| matches(&payload))
            .unwrap_or(false),
        payload => matches(payload),
    }
}

/// Deployment id written on the build itself
pub fn own_deployment_id(build: &Build) -> Option<u64> {
    build
        .parameter(DEPLOYMENT_ID_PARAM_KEY)
        .and_then(|id| id.trim().parse().ok())
}

/// Deployment id of the first dependency that carries one
pub fn chain_deployment_id(build: &Build) -> Option<u64> {
    build
        .dependencies
        .iter()
        .find(|d| d.parameters.contains_key(DEPLOYMENT_ID_PARAM_KEY))
        .and_then(|d| d.parameters.get(DEPLOYMENT_ID_PARAM_KEY))
        .and_then(|id| id.trim().parse().ok())
}

/// Translates build lifecycle events into GitHub deployment statuses
#[derive(Clone)]
pub struct GitHubDeploymentsPublisher {
    base: PublisherBase,
    services: Arc<GitHubServices>,
}

impl GitHubDeploymentsPublisher {
    pub fn new(base: PublisherBase, services: Arc<GitHubServices>) -> Self {
        Self { base, services }
    }

    /// Target environment, `production` unless configured
    pub fn environment(&self) -> String {
        self.base
            .param(TARGET_ENVIRONMENT_PARAM)
            .map(str::trim)
            .filter(|env| !env.is_empty())
            .unwrap_or(TARGET_ENVIRONMENT_DEFAULT)
            .to_string()
    }

    fn handler(&self, build: &Build, revision: &Revision) -> Result<Arc<UpdateHandler>, PublisherError> {
        let params = params::for_build(self.base.build_type(), build, self.base.params());
        UpdateHandler::new(
            &revision.root,
            &params,
            self.base.connection_timeout(),
            &self.services.user_agent,
        )
    }

    fn report(&self, message: &str, build: &Build, error: Option<&PublisherError>) {
        let destination = self.destination();
        self.base
            .problems()
            .report_problem(message, self, &build.describe(), destination.as_deref(), error);
    }

    /// Create the deployment, holding the per-configuration lock
    ///
    /// Invalid settings are returned to the caller. GitHub failures are
    /// reported here and yield no deployment.
    async fn create_deployment(
        &self,
        build: &Build,
        revision: &Revision,
    ) -> Result<Option<Deployment>, PublisherError> {
        let state = DeploymentStatusState::Pending;
        let handler = self.handler(build, revision)?;

        let hash = handler.resolve_commit_hash(revision, build.id, state.as_str()).await;
        let merge = hash != revision.version;
        let environment = self.environment();
        let request = DeploymentRequest::deploy(
            hash.clone(),
            environment.clone(),
            handler.description("TeamCity build starting", merge),
            deployment_payload(build.id),
        );

        let _guard = self.base.locks().lock(&self.base.build_type().external_id).await;
        let repository = handler.repository();
        match handler
            .client()
            .create_deployment(&repository.owner, &repository.name, &request)
            .await
        {
            Ok(deployment) => {
                info!(
                    "Created deployment {} for {} in environment {} (hash: {}, build: {})",
                    deployment.id,
                    repository,
                    environment,
                    hash,
                    build.describe()
                );
                Ok(Some(deployment))
            }
            Err(e) => {
                self.report(&updater_error(state), build, Some(&e));
                Ok(None)
            }
        }
    }

    /// Find the deployment a status update belongs to
    async fn find_deployment_id(
        &self,
        handler: &UpdateHandler,
        hash: &str,
        environment: &str,
        build: &Build,
    ) -> Result<Option<u64>, PublisherError> {
        let own = own_deployment_id(build);
        if own.is_some() {
            debug!("deploymentIds: own({:?})", own);
            return Ok(own);
        }

        let chain = chain_deployment_id(build);
        if chain.is_some() {
            debug!("deploymentIds: own(None)/buildChain({:?})", chain);
            return Ok(chain);
        }

        let repository = handler.repository();
        let deployments = handler
            .client()
            .get_deployments(&repository.owner, &repository.name, hash, environment)
            .await?;
        let remote = deployments
            .iter()
            .find(|d| has_build_id(d, build.id))
            .map(|d| d.id);
        debug!("deploymentIds: own(None)/buildChain(None)/gitHub({:?})", remote);
        Ok(remote)
    }

    /// Queue a deployment status update on the scheduler
    fn schedule_update(
        &self,
        build: &Build,
        revision: &Revision,
        state: DeploymentStatusState,
        message: &str,
    ) -> Result<bool, PublisherError> {
        let handler = self.handler(build, revision)?;
        let publisher = self.clone();
        let build = build.clone();
        let revision = revision.clone();
        let message = message.to_string();
        let name = format!("deployment status {} for build {}", state, build.id);
        self.services.scheduler.spawn(&name, async move {
            publisher
                .update_status(&handler, &build, &revision, state, &message)
                .await;
        });
        Ok(true)
    }

    async fn update_status(
        &self,
        handler: &UpdateHandler,
        build: &Build,
        revision: &Revision,
        state: DeploymentStatusState,
        message: &str,
    ) {
        let hash = handler.resolve_commit_hash(revision, build.id, state.as_str()).await;
        let merge = hash != revision.version;
        let environment = self.environment();

        let _guard = self.base.locks().lock(&self.base.build_type().external_id).await;
        let deployment_id = match self.find_deployment_id(handler, &hash, &environment, build).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                let message = format!(
                    "Deployments Status Publisher error. DeploymentId not found for hash: {}, environment: {}, build: {}",
                    hash,
                    environment,
                    build.describe()
                );
                self.report(&message, build, None);
                return;
            }
            Err(e) => {
                self.report(&updater_error(state), build, Some(&e));
                return;
            }
        };

        let request = DeploymentStatusRequest {
            state,
            log_url: Some(self.services.server.view_results_url(build)),
            description: Some(handler.description(message, merge)),
            environment: Some(environment),
        };
        let repository = handler.repository();
        match handler
            .client()
            .create_deployment_status(&repository.owner, &repository.name, deployment_id, &request)
            .await
        {
            Ok(status) => {
                info!(
                    "Updated deployment {} of {} with status {} (id: {}, build: {})",
                    deployment_id,
                    repository,
                    state,
                    status.id,
                    build.describe()
                );
            }
            Err(e) => self.report(&updater_error(state), build, Some(&e)),
        }
    }

    fn build_completed(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.schedule_update(build, revision, deployment_state(build.status), finished_text(build.status))
    }

    fn build_in_progress(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.schedule_update(build, revision, DeploymentStatusState::InProgress, "TeamCity build started")
    }
}

fn updater_error(state: DeploymentStatusState) -> String {
    format!("Deployments Status Publisher error. GitHub status: '{}'", state)
}

#[async_trait]
impl Publisher for GitHubDeploymentsPublisher {
    fn base(&self) -> &PublisherBase {
        &self.base
    }

    fn id(&self) -> &str {
        GITHUB_PUBLISHER_ID
    }

    fn describe(&self) -> String {
        "GitHub".to_string()
    }

    fn destination(&self) -> Option<String> {
        self.base.param(crate::constants::GITHUB_SERVER).map(str::to_string)
    }

    async fn build_starting(&self, build: &Build, revision: &Revision) -> Result<Option<String>, PublisherError> {
        if !self.is_creating_deployment_enabled() {
            debug!("Deployment creation is disabled for {}", build.describe());
            return Ok(None);
        }
        if revision.root.vcs_name != GIT_VCS_NAME {
            warn!(
                "No revisions were found to create GitHub deployment for build {}. Please check you have Git VCS roots in the build configuration",
                build.describe()
            );
            return Ok(None);
        }
        Ok(self
            .create_deployment(build, revision)
            .await?
            .map(|d| d.id.to_string()))
    }

    async fn build_started(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.build_in_progress(build, revision)
    }

    async fn build_finished(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.build_completed(build, revision)
    }

    async fn build_interrupted(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.build_completed(build, revision)
    }

    async fn build_marked_as_successful(
        &self,
        build: &Build,
        revision: &Revision,
        build_in_progress: bool,
    ) -> Result<bool, PublisherError> {
        if build_in_progress {
            self.build_in_progress(build, revision)
        } else {
            self.build_completed(build, revision)
        }
    }
}
