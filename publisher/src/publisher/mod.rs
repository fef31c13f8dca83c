//! Status publishers
//!
//! A publisher is created per build feature each time an event is dispatched.
//! Event methods return `Ok(true)` when they published (or scheduled) something.

pub mod manager;
pub mod problems;
pub mod service;
pub mod settings;
pub mod tasks;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::constants::{CREATE_DEPLOYMENT_PARAM, VCS_ROOT_ID_PARAM};
use crate::errors::PublisherError;
use crate::events::Event;
use crate::host::{Build, BuildConfiguration, QueuedBuild, Revision};
use crate::publisher::problems::ProblemTracker;
use crate::publisher::settings::PublisherSettings;
use crate::sync::locks::KeyedLocks;

/// Default connect/read/write timeout for publisher HTTP calls
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_millis(300 * 1000);

/// State shared by all publisher implementations
#[derive(Clone)]
pub struct PublisherBase {
    settings: Arc<dyn PublisherSettings>,
    build_type: BuildConfiguration,
    build_feature_id: String,
    params: HashMap<String, String>,
    problems: Arc<ProblemTracker>,
    locks: Arc<KeyedLocks>,
    connection_timeout: Duration,
}

impl PublisherBase {
    pub fn new(
        settings: Arc<dyn PublisherSettings>,
        build_type: &BuildConfiguration,
        build_feature_id: &str,
        params: &HashMap<String, String>,
        problems: Arc<ProblemTracker>,
        locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            settings,
            build_type: build_type.clone(),
            build_feature_id: build_feature_id.to_string(),
            params: params.clone(),
            problems,
            locks,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn settings(&self) -> &Arc<dyn PublisherSettings> {
        &self.settings
    }

    pub fn build_type(&self) -> &BuildConfiguration {
        &self.build_type
    }

    pub fn build_feature_id(&self) -> &str {
        &self.build_feature_id
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn problems(&self) -> &Arc<ProblemTracker> {
        &self.problems
    }

    pub fn locks(&self) -> &Arc<KeyedLocks> {
        &self.locks
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }
}

/// Publishes build lifecycle events to one external target
#[async_trait]
pub trait Publisher: Send + Sync {
    fn base(&self) -> &PublisherBase;

    /// Publisher type id
    fn id(&self) -> &str;

    /// Short name used in log lines
    fn describe(&self) -> String {
        self.id().to_string()
    }

    /// Server the publisher talks to, shown in problem descriptions
    fn destination(&self) -> Option<String> {
        None
    }

    fn build_feature_id(&self) -> &str {
        self.base().build_feature_id()
    }

    fn build_type(&self) -> &BuildConfiguration {
        self.base().build_type()
    }

    /// VCS root the feature is restricted to (external or internal id)
    fn vcs_root_id(&self) -> Option<&str> {
        self.base().param(VCS_ROOT_ID_PARAM)
    }

    fn is_creating_deployment_enabled(&self) -> bool {
        self.base().param(CREATE_DEPLOYMENT_PARAM) == Some("true")
    }

    fn is_publishing_for_revision(&self, revision: &Revision) -> bool {
        self.base().settings().is_publishing_for_vcs_root(&revision.root)
    }

    fn is_event_supported(&self, event: Event) -> bool {
        self.base().settings().is_event_supported(event)
    }

    async fn build_queued(
        &self,
        _build: &QueuedBuild,
        _revision: &Revision,
    ) -> Result<bool, PublisherError> {
        Ok(false)
    }

    async fn build_removed_from_queue(
        &self,
        _build: &QueuedBuild,
        _revision: &Revision,
        _user: Option<&str>,
        _comment: Option<&str>,
    ) -> Result<bool, PublisherError> {
        Ok(false)
    }

    /// Create the external deployment, returning its id
    async fn build_starting(
        &self,
        _build: &Build,
        _revision: &Revision,
    ) -> Result<Option<String>, PublisherError> {
        Ok(None)
    }

    async fn build_started(&self, _build: &Build, _revision: &Revision) -> Result<bool, PublisherError> {
        Ok(false)
    }

    async fn build_finished(&self, _build: &Build, _revision: &Revision) -> Result<bool, PublisherError> {
        Ok(false)
    }

    async fn build_commented(
        &self,
        _build: &Build,
        _revision: &Revision,
        _user: Option<&str>,
        _comment: Option<&str>,
        _build_in_progress: bool,
    ) -> Result<bool, PublisherError> {
        Ok(false)
    }

    async fn build_interrupted(
        &self,
        _build: &Build,
        _revision: &Revision,
    ) -> Result<bool, PublisherError> {
        Ok(false)
    }

    async fn build_failure_detected(
        &self,
        _build: &Build,
        _revision: &Revision,
    ) -> Result<bool, PublisherError> {
        Ok(false)
    }

    async fn build_marked_as_successful(
        &self,
        _build: &Build,
        _revision: &Revision,
        _build_in_progress: bool,
    ) -> Result<bool, PublisherError> {
        Ok(false)
    }
}
