//! Publisher registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::{DUMMY_PUBLISHER_ID, PUBLISHER_ID_PARAM};
use crate::host::BuildConfiguration;
use crate::publisher::settings::{InvalidProperty, PublisherSettings};
use crate::publisher::Publisher;

/// Publisher settings by publisher id
#[derive(Default)]
pub struct PublisherManager {
    settings_by_id: HashMap<String, Arc<dyn PublisherSettings>>,
}

impl PublisherManager {
    pub fn new(settings: impl IntoIterator<Item = Arc<dyn PublisherSettings>>) -> Self {
        let settings_by_id = settings
            .into_iter()
            .map(|s| (s.id().to_string(), s))
            .collect();
        Self { settings_by_id }
    }

    pub fn register(&mut self, settings: Arc<dyn PublisherSettings>) {
        self.settings_by_id.insert(settings.id().to_string(), settings);
    }

    pub fn find_settings(&self, publisher_id: &str) -> Option<Arc<dyn PublisherSettings>> {
        self.settings_by_id.get(publisher_id).cloned()
    }

    /// Enabled settings sorted by display name
    pub fn all_publisher_settings(&self) -> Vec<Arc<dyn PublisherSettings>> {
        let mut settings: Vec<_> = self
            .settings_by_id
            .values()
            .filter(|s| s.is_enabled())
            .cloned()
            .collect();
        settings.sort_by(|a, b| a.name().cmp(b.name()));
        settings
    }

    /// Publisher for a build feature, if its `publisherId` is known
    pub fn create_publisher(
        &self,
        build_type: &BuildConfiguration,
        build_feature_id: &str,
        params: &HashMap<String, String>,
    ) -> Option<Arc<dyn Publisher>> {
        let publisher_id = params.get(PUBLISHER_ID_PARAM)?;
        let settings = self.find_settings(publisher_id)?;
        settings.create_publisher(build_type, build_feature_id, params)
    }

    /// Feature summary shown next to the build feature
    pub fn describe_feature(&self, params: &HashMap<String, String>) -> String {
        params
            .get(PUBLISHER_ID_PARAM)
            .and_then(|id| self.find_settings(id))
            .map(|settings| settings.describe_parameters(params))
            .unwrap_or_default()
    }

    /// Validate build feature parameters
    pub fn validate_feature(&self, params: &HashMap<String, String>) -> Vec<InvalidProperty> {
        let publisher_id = params.get(PUBLISHER_ID_PARAM).map(|id| id.trim());
        let publisher_id = match publisher_id {
            Some(id) if !id.is_empty() && id != DUMMY_PUBLISHER_ID => id,
            _ => return vec![InvalidProperty::new(PUBLISHER_ID_PARAM, "Choose a publisher")],
        };
        match self.find_settings(publisher_id) {
            Some(settings) => settings.validate_parameters(params),
            None => vec![],
        }
    }
}
