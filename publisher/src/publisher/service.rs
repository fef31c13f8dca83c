//! Publisher and revision resolution

use std::sync::Arc;

use tracing::{debug, warn};

use crate::constants::BUILD_FEATURE_NAME;
use crate::host::{Build, BuildConfiguration, BuildServer, QueuedBuild, Revision};
use crate::publisher::manager::PublisherManager;
use crate::publisher::Publisher;

/// Resolves which publishers and revisions an event applies to
pub struct PublisherService {
    manager: Arc<PublisherManager>,
}

impl PublisherService {
    pub fn new(manager: Arc<PublisherManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<PublisherManager> {
        &self.manager
    }

    /// One publisher per publisher feature, keyed by feature id, in configuration order
    pub fn get_publishers(&self, build_type: &BuildConfiguration) -> Vec<(String, Arc<dyn Publisher>)> {
        let mut publishers: Vec<(String, Arc<dyn Publisher>)> = Vec::new();
        for feature in build_type.features_of_type(BUILD_FEATURE_NAME) {
            if publishers.iter().any(|(id, _)| *id == feature.id) {
                continue;
            }
            match self
                .manager
                .create_publisher(build_type, &feature.id, &feature.parameters)
            {
                Some(publisher) => publishers.push((feature.id.clone(), publisher)),
                None => debug!(
                    "No publisher for feature {} of build configuration {}",
                    feature.id, build_type.external_id
                ),
            }
        }
        publishers
    }

    /// Revisions of `build` the publisher should report on
    pub fn get_build_revisions_for_vote(&self, publisher: &dyn Publisher, build: &Build) -> Vec<Revision> {
        if build.failed_to_collect_changes {
            return vec![];
        }

        let Some(vcs_root_id) = publisher.vcs_root_id() else {
            warn!("fallback to find a publishing revision");
            return build
                .revisions
                .iter()
                .filter(|r| publisher.is_publishing_for_revision(r))
                .cloned()
                .collect();
        };

        build
            .revisions
            .iter()
            .find(|r| vcs_root_id == r.root.external_id || vcs_root_id == r.root.id.to_string())
            .cloned()
            .into_iter()
            .collect()
    }

    /// Revisions of a queued build, via its build or the branch's latest changes
    pub fn get_queued_build_revisions_for_vote(
        &self,
        build_type: &BuildConfiguration,
        publisher: &dyn Publisher,
        build: &QueuedBuild,
        server: &dyn BuildServer,
    ) -> Vec<Revision> {
        if let Some(associated) = &build.associated_build {
            let revisions = self.get_build_revisions_for_vote(publisher, associated);
            if !revisions.is_empty() {
                return revisions;
            }
        }

        let branch = build
            .branch
            .as_deref()
            .unwrap_or(build_type.default_branch.as_str());
        match server.branch_dummy_build(build_type, branch) {
            Some(dummy) => self.get_build_revisions_for_vote(publisher, &dummy),
            None => vec![],
        }
    }
}
