//! Replay of recorded build server events

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::console::ConsoleHost;
use crate::dispatch::listener::DeploymentsStatusListener;
use crate::host::{Build, BuildConfiguration, BuildProblem, BuildStatus, QueuedBuild};

/// One recorded build server callback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Queued {
        build_type: BuildConfiguration,
        build: QueuedBuild,
    },
    RemovedFromQueue {
        build_type: BuildConfiguration,
        build: QueuedBuild,
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        comment: Option<String>,
    },
    Starting {
        build_type: BuildConfiguration,
        build: Build,
    },
    Started {
        build_type: BuildConfiguration,
        build: Build,
    },
    Finished {
        build_type: BuildConfiguration,
        build: Build,
    },
    Interrupted {
        build_type: BuildConfiguration,
        build: Build,
    },
    Commented {
        build_type: BuildConfiguration,
        build: Build,
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        comment: Option<String>,
    },
    StatusChanged {
        build_type: BuildConfiguration,
        build: Build,
        old_status: BuildStatus,
        new_status: BuildStatus,
    },
    ProblemsChanged {
        build_type: BuildConfiguration,
        build: Build,
        #[serde(default)]
        before: Vec<BuildProblem>,
        #[serde(default)]
        after: Vec<BuildProblem>,
    },
    /// A VCS root was given a new external id
    VcsRootRenamed {
        old_external_id: String,
        #[serde(default)]
        old_internal_id: Option<u64>,
        new_external_id: String,
    },
}

impl HostEvent {
    fn build_mut(&mut self) -> Option<&mut Build> {
        match self {
            HostEvent::Queued { .. } | HostEvent::RemovedFromQueue { .. } => None,
            HostEvent::Starting { build, .. }
            | HostEvent::Started { build, .. }
            | HostEvent::Finished { build, .. }
            | HostEvent::Interrupted { build, .. }
            | HostEvent::Commented { build, .. }
            | HostEvent::StatusChanged { build, .. }
            | HostEvent::ProblemsChanged { build, .. } => Some(build),
            HostEvent::VcsRootRenamed { .. } => None,
        }
    }

    fn build_type_mut(&mut self) -> Option<&mut BuildConfiguration> {
        match self {
            HostEvent::Queued { build_type, .. }
            | HostEvent::RemovedFromQueue { build_type, .. }
            | HostEvent::Starting { build_type, .. }
            | HostEvent::Started { build_type, .. }
            | HostEvent::Finished { build_type, .. }
            | HostEvent::Interrupted { build_type, .. }
            | HostEvent::Commented { build_type, .. }
            | HostEvent::StatusChanged { build_type, .. }
            | HostEvent::ProblemsChanged { build_type, .. } => Some(build_type),
            HostEvent::VcsRootRenamed { .. } => None,
        }
    }
}

struct VcsRootRename {
    old_external_id: String,
    old_internal_id: Option<u64>,
    new_external_id: String,
}

/// Feed events through the listener in order
///
/// Parameters returned while a build is starting are added to all later
/// events of the same build. VCS root renames are applied to the build
/// configurations of all later events.
pub async fn replay(listener: &DeploymentsStatusListener, host: &ConsoleHost, events: Vec<HostEvent>) {
    let mut shared: HashMap<u64, HashMap<String, String>> = HashMap::new();
    let mut renames: Vec<VcsRootRename> = Vec::new();

    for mut event in events {
        if let Some(build_type) = event.build_type_mut() {
            for rename in &renames {
                listener.vcs_root_external_id_changed(
                    std::slice::from_mut(&mut *build_type),
                    &rename.old_external_id,
                    rename.old_internal_id,
                    &rename.new_external_id,
                );
            }
        }
        if let Some(build) = event.build_mut() {
            if let Some(params) = shared.get(&build.id) {
                build.parameters.extend(params.clone());
            }
            host.record(build.clone());
        }

        match &event {
            HostEvent::Queued { build_type, build } => {
                listener.build_type_added_to_queue(build_type, build).await;
            }
            HostEvent::RemovedFromQueue {
                build_type,
                build,
                user,
                comment,
            } => {
                listener
                    .build_removed_from_queue(build_type, build, user.as_deref(), comment.as_deref())
                    .await;
            }
            HostEvent::Starting { build_type, build } => {
                let params = listener.build_starting(build_type, build).await;
                info!("Build {} starting with shared parameters {:?}", build.id, params);
                shared.entry(build.id).or_default().extend(params);
            }
            HostEvent::Started { build_type, build } => {
                listener.build_started(build_type, build).await;
            }
            HostEvent::Finished { build_type, build } => {
                host.finish(build.id);
                listener.build_finished(build_type, build).await;
            }
            HostEvent::Interrupted { build_type, build } => {
                host.finish(build.id);
                listener.build_interrupted(build_type, build).await;
            }
            HostEvent::Commented {
                build_type,
                build,
                user,
                comment,
            } => {
                listener
                    .build_commented(build_type, build, user.as_deref(), comment.as_deref())
                    .await;
            }
            HostEvent::StatusChanged {
                build_type,
                build,
                old_status,
                new_status,
            } => {
                listener
                    .build_changed_status(build_type, build, *old_status, *new_status)
                    .await;
            }
            HostEvent::ProblemsChanged {
                build_type,
                build,
                before,
                after,
            } => {
                listener
                    .build_problems_changed(build_type, build, before, after)
                    .await;
            }
            HostEvent::VcsRootRenamed {
                old_external_id,
                old_internal_id,
                new_external_id,
            } => {
                info!("VCS root {} renamed to {}", old_external_id, new_external_id);
                renames.push(VcsRootRename {
                    old_external_id: old_external_id.clone(),
                    old_internal_id: *old_internal_id,
                    new_external_id: new_external_id.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event() {
        let event: HostEvent = serde_json::from_str(
            r#"{
                "event": "status_changed",
                "build_type": {"internal_id": "bt1", "external_id": "P_B", "name": "B", "project_name": "P"},
                "build": {"id": 1, "build_type_id": "bt1", "status": "failure"},
                "old_status": "normal",
                "new_status": "failure"
            }"#,
        )
        .unwrap();
        match event {
            HostEvent::StatusChanged { build_type, new_status, .. } => {
                assert_eq!(build_type.default_branch, "<default>");
                assert_eq!(new_status, BuildStatus::Failure);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_vcs_root_renamed() {
        let event: HostEvent = serde_json::from_str(
            r#"{"event": "vcs_root_renamed", "old_external_id": "P_Old", "new_external_id": "P_New"}"#,
        )
        .unwrap();
        match event {
            HostEvent::VcsRootRenamed {
                old_external_id,
                old_internal_id,
                new_external_id,
            } => {
                assert_eq!(old_external_id, "P_Old");
                assert_eq!(old_internal_id, None);
                assert_eq!(new_external_id, "P_New");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
