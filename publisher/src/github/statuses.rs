//! GitHub commit status publisher

use std::sync::Arc;

use async_trait::async_trait;
use github_client::{CommitStatusRequest, CommitStatusState};
use tracing::info;

use crate::constants::{GITHUB_SERVER, GITHUB_STATUS_PUBLISHER_ID};
use crate::errors::PublisherError;
use crate::github::params;
use crate::github::settings::GitHubServices;
use crate::github::updater::{commit_state, finished_text, UpdateHandler};
use crate::host::{Build, Revision};
use crate::publisher::{Publisher, PublisherBase};
use crate::utils::truncate_with_ellipsis;

/// GitHub rejects longer status descriptions
const MAX_DESCRIPTION_LENGTH: usize = 140;

/// Commit comment text for a build comment
pub fn comment_body(build: &Build, user: Option<&str>, comment: &str) -> String {
    match user {
        Some(user) => format!("TeamCity build {} comment by {}:\n\n{}", build.build_number, user, comment),
        None => format!("TeamCity build {} comment:\n\n{}", build.build_number, comment),
    }
}

/// Posts commit statuses and comments for builds
#[derive(Clone)]
pub struct GitHubStatusPublisher {
    base: PublisherBase,
    services: Arc<GitHubServices>,
}

impl GitHubStatusPublisher {
    pub fn new(base: PublisherBase, services: Arc<GitHubServices>) -> Self {
        Self { base, services }
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

    fn schedule_status(
        &self,
        build: &Build,
        revision: &Revision,
        state: CommitStatusState,
        message: &str,
    ) -> Result<bool, PublisherError> {
        let handler = self.handler(build, revision)?;
        let publisher = self.clone();
        let build = build.clone();
        let revision = revision.clone();
        let message = message.to_string();
        let name = format!("commit status {:?} for build {}", state, build.id);
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
        state: CommitStatusState,
        message: &str,
    ) {
        let status = format!("{:?}", state).to_lowercase();
        let hash = handler.resolve_commit_hash(revision, build.id, &status).await;
        let merge = hash != revision.version;
        let request = CommitStatusRequest {
            state,
            target_url: Some(self.services.server.view_results_url(build)),
            description: Some(truncate_with_ellipsis(message, MAX_DESCRIPTION_LENGTH)),
            context: Some(handler.status_context(merge)),
        };

        let _guard = self.base.locks().lock(&self.base.build_type().external_id).await;
        let repository = handler.repository();
        match handler
            .client()
            .set_commit_status(&repository.owner, &repository.name, &hash, &request)
            .await
        {
            Ok(_) => info!(
                "Updated commit status of {} in {} to {} (build: {})",
                hash,
                repository,
                status,
                build.describe()
            ),
            Err(e) => self.report(
                &format!("Deployments Status Publisher error. GitHub status: '{}'", status),
                build,
                Some(&e),
            ),
        }
    }

    fn schedule_comment(
        &self,
        build: &Build,
        revision: &Revision,
        body: String,
    ) -> Result<bool, PublisherError> {
        let handler = self.handler(build, revision)?;
        let publisher = self.clone();
        let build = build.clone();
        let revision = revision.clone();
        let name = format!("commit comment for build {}", build.id);
        self.services.scheduler.spawn(&name, async move {
            let hash = handler.resolve_commit_hash(&revision, build.id, "comment").await;
            let repository = handler.repository();
            if let Err(e) = handler
                .client()
                .post_comment(&repository.owner, &repository.name, &hash, &body)
                .await
            {
                publisher.report("Failed to add comment to GitHub commit", &build, Some(&e));
            }
        });
        Ok(true)
    }

    fn build_completed(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.schedule_status(build, revision, commit_state(build.status), finished_text(build.status))
    }

    fn build_in_progress(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.schedule_status(build, revision, CommitStatusState::Pending, "TeamCity build started")
    }
}

#[async_trait]
impl Publisher for GitHubStatusPublisher {
    fn base(&self) -> &PublisherBase {
        &self.base
    }

    fn id(&self) -> &str {
        GITHUB_STATUS_PUBLISHER_ID
    }

    fn describe(&self) -> String {
        "GitHub commit status".to_string()
    }

    fn destination(&self) -> Option<String> {
        self.base.param(GITHUB_SERVER).map(str::to_string)
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

    async fn build_commented(
        &self,
        build: &Build,
        revision: &Revision,
        user: Option<&str>,
        comment: Option<&str>,
        _build_in_progress: bool,
    ) -> Result<bool, PublisherError> {
        match comment.filter(|c| !c.trim().is_empty()) {
            Some(comment) => self.schedule_comment(build, revision, comment_body(build, user, comment)),
            None => Ok(false),
        }
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
