//! Build server event entry points

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::dispatch::runner::TaskRunner;
use crate::events::Event;
use crate::features;
use crate::host::{Build, BuildConfiguration, BuildProblem, BuildServer, BuildStatus, QueuedBuild};
use crate::publisher::tasks::{BuildTask, QueuedTask};

/// Translates build server callbacks into publish tasks
pub struct DeploymentsStatusListener {
    runner: Arc<TaskRunner>,
    server: Arc<dyn BuildServer>,
}

impl DeploymentsStatusListener {
    pub fn new(runner: Arc<TaskRunner>, server: Arc<dyn BuildServer>) -> Self {
        Self { runner, server }
    }

    pub fn runner(&self) -> &Arc<TaskRunner> {
        &self.runner
    }

    fn is_build_in_progress(&self, build: &Build) -> bool {
        self.server.is_running(build.id)
    }

    pub async fn build_type_added_to_queue(&self, build_type: &BuildConfiguration, build: &QueuedBuild) {
        self.runner
            .run_for_every_publisher_queued(Event::Queued, build_type, build, &QueuedTask::Queued)
            .await;
    }

    pub async fn build_removed_from_queue(
        &self,
        build_type: &BuildConfiguration,
        build: &QueuedBuild,
        user: Option<&str>,
        comment: Option<&str>,
    ) {
        let Some(user) = user else {
            return;
        };
        let task = QueuedTask::RemovedFromQueue {
            user: Some(user.to_string()),
            comment: comment.map(str::to_string),
        };
        self.runner
            .run_for_every_publisher_queued(Event::RemovedFromQueue, build_type, build, &task)
            .await;
    }

    /// Called while the build start context is prepared
    ///
    /// Returns parameters to add to the build, e.g. the created deployment id.
    pub async fn build_starting(
        &self,
        build_type: &BuildConfiguration,
        build: &Build,
    ) -> HashMap<String, String> {
        let task = BuildTask::starting();
        self.runner
            .run_for_every_publisher(Event::Starting, build_type, build, &task)
            .await;
        task.into_shared_params()
    }

    pub async fn build_started(&self, build_type: &BuildConfiguration, build: &Build) {
        self.runner
            .run_for_every_publisher(Event::Started, build_type, build, &BuildTask::Started)
            .await;
    }

    pub async fn build_finished(&self, build_type: &BuildConfiguration, build: &Build) {
        let Some(finished) = self.server.finished_build(build.id) else {
            debug!(
                "Event: {}, cannot find finished build for build {}",
                Event::Finished.name(),
                build.describe()
            );
            return;
        };
        self.runner
            .run_for_every_publisher(Event::Finished, build_type, &finished, &BuildTask::Finished)
            .await;
    }

    pub async fn build_commented(
        &self,
        build_type: &BuildConfiguration,
        build: &Build,
        user: Option<&str>,
        comment: Option<&str>,
    ) {
        let task = BuildTask::Commented {
            user: user.map(str::to_string),
            comment: comment.map(str::to_string),
            build_in_progress: self.is_build_in_progress(build),
        };
        self.runner
            .run_for_every_publisher(Event::Commented, build_type, build, &task)
            .await;
    }

    pub async fn build_interrupted(&self, build_type: &BuildConfiguration, build: &Build) {
        let Some(finished) = self.server.finished_build(build.id) else {
            debug!(
                "Event: {}, cannot find finished build for build {}",
                Event::Interrupted.name(),
                build.describe()
            );
            return;
        };
        self.runner
            .run_for_every_publisher(
                Event::Interrupted,
                build_type,
                &finished,
                &BuildTask::Interrupted,
            )
            .await;
    }

    /// Only a transition into a failed status is reported
    pub async fn build_changed_status(
        &self,
        build_type: &BuildConfiguration,
        build: &Build,
        old_status: BuildStatus,
        new_status: BuildStatus,
    ) {
        if old_status.is_failed() || !new_status.is_failed() {
            return;
        }
        self.runner
            .run_for_every_publisher(
                Event::FailureDetected,
                build_type,
                build,
                &BuildTask::FailureDetected,
            )
            .await;
    }

    /// Repoint publishing features at a VCS root whose external id changed
    ///
    /// Returns the external ids of the configurations that need persisting.
    pub fn vcs_root_external_id_changed(
        &self,
        build_types: &mut [BuildConfiguration],
        old_external_id: &str,
        old_internal_id: Option<u64>,
        new_external_id: &str,
    ) -> Vec<String> {
        features::vcs_root_external_id_changed(build_types, old_external_id, old_internal_id, new_external_id)
    }

    /// Reported as marked successful once all build problems are muted or removed
    pub async fn build_problems_changed(
        &self,
        build_type: &BuildConfiguration,
        build: &Build,
        before: &[BuildProblem],
        after: &[BuildProblem],
    ) {
        if before.is_empty() || !after.is_empty() {
            return;
        }
        let task = BuildTask::MarkedAsSuccessful {
            build_in_progress: self.is_build_in_progress(build),
        };
        self.runner
            .run_for_every_publisher(Event::MarkedAsSuccessful, build_type, build, &task)
            .await;
    }
}
