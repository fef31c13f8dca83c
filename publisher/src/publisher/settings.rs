//! Publisher settings

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::PublisherError;
use crate::events::Event;
use crate::host::{BuildConfiguration, VcsRoot};
use crate::publisher::Publisher;

/// A rejected feature parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidProperty {
    pub property_name: String,
    pub reason: String,
}

impl InvalidProperty {
    pub fn new(property_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            reason: reason.into(),
        }
    }
}

/// Describes, validates and creates publishers of one type
#[async_trait]
pub trait PublisherSettings: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool {
        true
    }

    /// Parameters pre-filled for a new feature
    fn default_parameters(&self) -> Option<HashMap<String, String>> {
        None
    }

    fn describe_parameters(&self, _params: &HashMap<String, String>) -> String {
        format!("Post deployment status to {}", self.name())
    }

    fn validate_parameters(&self, _params: &HashMap<String, String>) -> Vec<InvalidProperty> {
        vec![]
    }

    fn create_publisher(
        &self,
        build_type: &BuildConfiguration,
        build_feature_id: &str,
        params: &HashMap<String, String>,
    ) -> Option<Arc<dyn Publisher>>;

    fn is_publishing_for_vcs_root(&self, _root: &VcsRoot) -> bool {
        true
    }

    fn is_event_supported(&self, _event: Event) -> bool {
        false
    }

    fn is_test_connection_supported(&self) -> bool {
        false
    }

    /// Check that the configured target is reachable for `root`
    async fn test_connection(
        &self,
        _build_type: &BuildConfiguration,
        _root: &VcsRoot,
        _params: &HashMap<String, String>,
    ) -> Result<(), PublisherError> {
        Err(PublisherError::ConfigError(format!(
            "Test connection functionality is not supported by {} publisher",
            self.name()
        )))
    }
}
