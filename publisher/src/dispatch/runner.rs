//! Runs a publish task for every configured publisher

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::events::EventHistory;
use crate::constants::{
    BUILD_PROBLEM_ID_PREFIX, BUILD_PROBLEM_TYPE, FAIL_BUILD_ON_PUBLISH_ERROR_PARAM,
    PUBLISHING_ENABLED_PROPERTY_NAME,
};
use crate::errors::PublisherError;
use crate::events::Event;
use crate::host::{Build, BuildConfiguration, BuildProblem, BuildServer, QueuedBuild, Revision};
use crate::publisher::problems::ProblemTracker;
use crate::publisher::service::PublisherService;
use crate::publisher::tasks::{BuildTask, QueuedTask};
use crate::publisher::Publisher;
use crate::utils::{is_false, is_true};

/// Task runner options
#[derive(Debug, Clone)]
pub struct Options {
    /// Server-wide publishing switch
    pub publishing_enabled: bool,

    /// Number of builds remembered for event ordering
    pub event_history_capacity: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            publishing_enabled: true,
            event_history_capacity: 10_000,
        }
    }
}

/// Dispatches one event to all publishers of a build configuration
///
/// Publish failures end up as problem tickets and never reach the caller.
pub struct TaskRunner {
    service: PublisherService,
    problems: Arc<ProblemTracker>,
    server: Arc<dyn BuildServer>,
    history: EventHistory,
    publishing_enabled: bool,
}

impl TaskRunner {
    pub fn new(
        service: PublisherService,
        problems: Arc<ProblemTracker>,
        server: Arc<dyn BuildServer>,
        options: &Options,
    ) -> Self {
        Self {
            service,
            problems,
            server,
            history: EventHistory::new(options.event_history_capacity),
            publishing_enabled: options.publishing_enabled,
        }
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    fn is_publishing_disabled(&self, build_type: &BuildConfiguration) -> bool {
        let param = build_type.parameter(PUBLISHING_ENABLED_PROPERTY_NAME);
        is_false(param) || !(self.publishing_enabled || is_true(param))
    }

    fn should_fail_build(build_type: &BuildConfiguration) -> bool {
        is_true(build_type.parameter(FAIL_BUILD_ON_PUBLISH_ERROR_PARAM))
    }

    fn log_status_not_published(
        event: Event,
        build_description: &str,
        publisher: &dyn Publisher,
        message: &str,
    ) {
        info!(
            "Event: {}, build {}, publisher {}: {}",
            event.name(),
            build_description,
            publisher.describe(),
            message
        );
    }

    fn accept(&self, event: Event, build_id: u64, build_description: &str) -> bool {
        if self.history.accept(build_id, event) {
            return true;
        }
        info!(
            "Event: {}, build {}: a later event was already published, skipping",
            event.name(),
            build_description
        );
        false
    }

    pub async fn run_for_every_publisher(
        &self,
        event: Event,
        build_type: &BuildConfiguration,
        build: &Build,
        task: &BuildTask,
    ) {
        if build.personal && build.has_personal_changes {
            return;
        }
        let description = build.describe();
        if !self.accept(event, build.id, &description) {
            return;
        }

        let publishers = self.service.get_publishers(build_type);
        debug!(
            "Event: {}, build {}, publishers: {:?}",
            event.name(),
            description,
            publishers.iter().map(|(_, p)| p.describe()).collect::<Vec<_>>()
        );

        for (_, publisher) in &publishers {
            let publisher = publisher.as_ref();
            if !publisher.is_event_supported(event) {
                continue;
            }
            if self.is_publishing_disabled(build_type) {
                Self::log_status_not_published(
                    event,
                    &description,
                    publisher,
                    "deployments status publishing is disabled",
                );
                continue;
            }
            let revisions = self.service.get_build_revisions_for_vote(publisher, build);
            if revisions.is_empty() {
                Self::log_status_not_published(
                    event,
                    &description,
                    publisher,
                    "no compatible revisions found",
                );
                continue;
            }
            self.problems.clear_problem(publisher);
            for revision in &revisions {
                if let Err(e) = task.run(publisher, build, revision).await {
                    self.on_task_failed(event, build.id, &description, publisher, revision, e);
                }
            }
        }

        self.clear_obsolete_problems(build_type, &publishers);
    }

    pub async fn run_for_every_publisher_queued(
        &self,
        event: Event,
        build_type: &BuildConfiguration,
        build: &QueuedBuild,
        task: &QueuedTask,
    ) {
        if build.personal && build.has_personal_changes {
            return;
        }
        let description = build.describe();
        if !self.accept(event, build.build_id, &description) {
            return;
        }

        let publishers = self.service.get_publishers(build_type);
        debug!(
            "Event: {}, build {}, publishers: {:?}",
            event.name(),
            description,
            publishers.iter().map(|(_, p)| p.describe()).collect::<Vec<_>>()
        );

        for (_, publisher) in &publishers {
            let publisher = publisher.as_ref();
            if !publisher.is_event_supported(event) {
                continue;
            }
            if self.is_publishing_disabled(build_type) {
                Self::log_status_not_published(
                    event,
                    &description,
                    publisher,
                    "deployments status publishing is disabled",
                );
                continue;
            }
            let revisions = self.service.get_queued_build_revisions_for_vote(
                build_type,
                publisher,
                build,
                self.server.as_ref(),
            );
            if revisions.is_empty() {
                Self::log_status_not_published(
                    event,
                    &description,
                    publisher,
                    "no compatible revisions found",
                );
                continue;
            }
            self.problems.clear_problem(publisher);
            for revision in &revisions {
                if let Err(e) = task.run(publisher, build, revision).await {
                    self.on_task_failed(event, build.build_id, &description, publisher, revision, e);
                }
            }
        }

        self.clear_obsolete_problems(build_type, &publishers);
    }

    fn clear_obsolete_problems(
        &self,
        build_type: &BuildConfiguration,
        publishers: &[(String, Arc<dyn Publisher>)],
    ) {
        let current: HashSet<String> = publishers.iter().map(|(id, _)| id.clone()).collect();
        self.problems.clear_obsolete_problems(build_type, &current);
    }

    fn on_task_failed(
        &self,
        event: Event,
        build_id: u64,
        build_description: &str,
        publisher: &dyn Publisher,
        revision: &Revision,
        error: PublisherError,
    ) {
        self.problems.report_problem(
            &format!(
                "Deployments Status Publisher has failed to publish {} status",
                event.name()
            ),
            publisher,
            build_description,
            None,
            Some(&error),
        );

        if Self::should_fail_build(publisher.build_type()) {
            let problem = BuildProblem {
                identity: format!(
                    "{}.{}.{}",
                    BUILD_PROBLEM_ID_PREFIX,
                    publisher.id(),
                    revision.root.id
                ),
                problem_type: BUILD_PROBLEM_TYPE.to_string(),
                description: error.to_string(),
            };
            self.server.add_build_problem(build_id, problem);
        }
    }
}
