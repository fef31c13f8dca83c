//! Per-event publish tasks

use std::collections::HashMap;
use std::sync::Mutex;

use crate::constants::DEPLOYMENT_ID_PARAM_KEY;
use crate::errors::PublisherError;
use crate::host::{Build, QueuedBuild, Revision};
use crate::publisher::Publisher;

/// Work done for one publisher and revision of a running or finished build
pub enum BuildTask {
    /// Create the deployment if enabled, then report the build as started
    Starting {
        shared_params: Mutex<HashMap<String, String>>,
    },
    Started,
    Finished,
    Commented {
        user: Option<String>,
        comment: Option<String>,
        build_in_progress: bool,
    },
    Interrupted,
    FailureDetected,
    MarkedAsSuccessful {
        build_in_progress: bool,
    },
}

impl BuildTask {
    pub fn starting() -> Self {
        BuildTask::Starting {
            shared_params: Mutex::new(HashMap::new()),
        }
    }

    /// Parameters to share with dependent builds, collected by `Starting`
    pub fn into_shared_params(self) -> HashMap<String, String> {
        match self {
            BuildTask::Starting { shared_params } => {
                shared_params.into_inner().unwrap_or_else(|e| e.into_inner())
            }
            _ => HashMap::new(),
        }
    }

    pub async fn run(
        &self,
        publisher: &dyn Publisher,
        build: &Build,
        revision: &Revision,
    ) -> Result<bool, PublisherError> {
        match self {
            BuildTask::Starting { shared_params } => {
                if !publisher.is_creating_deployment_enabled() {
                    return publisher.build_started(build, revision).await;
                }
                let deployment_id = publisher
                    .build_starting(build, revision)
                    .await?
                    .unwrap_or_default();
                shared_params
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(DEPLOYMENT_ID_PARAM_KEY.to_string(), deployment_id.clone());
                if deployment_id.is_empty() {
                    return publisher.build_started(build, revision).await;
                }
                let mut started = build.clone();
                started
                    .parameters
                    .insert(DEPLOYMENT_ID_PARAM_KEY.to_string(), deployment_id);
                publisher.build_started(&started, revision).await
            }
            BuildTask::Started => publisher.build_started(build, revision).await,
            BuildTask::Finished => publisher.build_finished(build, revision).await,
            BuildTask::Commented {
                user,
                comment,
                build_in_progress,
            } => {
                publisher
                    .build_commented(
                        build,
                        revision,
                        user.as_deref(),
                        comment.as_deref(),
                        *build_in_progress,
                    )
                    .await
            }
            BuildTask::Interrupted => publisher.build_interrupted(build, revision).await,
            BuildTask::FailureDetected => publisher.build_failure_detected(build, revision).await,
            BuildTask::MarkedAsSuccessful { build_in_progress } => {
                publisher
                    .build_marked_as_successful(build, revision, *build_in_progress)
                    .await
            }
        }
    }
}

/// Work done for one publisher and revision of a queued build
pub enum QueuedTask {
    Queued,
    RemovedFromQueue {
        user: Option<String>,
        comment: Option<String>,
    },
}

impl QueuedTask {
    pub async fn run(
        &self,
        publisher: &dyn Publisher,
        build: &QueuedBuild,
        revision: &Revision,
    ) -> Result<bool, PublisherError> {
        match self {
            QueuedTask::Queued => publisher.build_queued(build, revision).await,
            QueuedTask::RemovedFromQueue { user, comment } => {
                publisher
                    .build_removed_from_queue(build, revision, user.as_deref(), comment.as_deref())
                    .await
            }
        }
    }
}
