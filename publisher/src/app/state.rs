//! Application state management

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::dispatch::listener::DeploymentsStatusListener;
use crate::dispatch::runner::TaskRunner;
use crate::errors::PublisherError;
use crate::github::settings::{GitHubDeploymentsSettings, GitHubServices, GitHubStatusSettings};
use crate::host::{BuildConfiguration, BuildServer, ProblemNotifier, VcsRoot};
use crate::publisher::manager::PublisherManager;
use crate::publisher::problems::ProblemTracker;
use crate::publisher::service::PublisherService;
use crate::publisher::settings::PublisherSettings;
use crate::sync::locks::KeyedLocks;
use crate::workers::scheduler::StatusScheduler;

/// Main application state
pub struct AppState {
    /// Entry point for build server events
    pub listener: Arc<DeploymentsStatusListener>,

    /// Registered publisher types
    pub manager: Arc<PublisherManager>,

    /// Raised problem tickets
    pub problems: Arc<ProblemTracker>,

    /// Background status updates
    pub scheduler: Arc<StatusScheduler>,

    /// Per build configuration locks
    pub locks: Arc<KeyedLocks>,
}

impl AppState {
    /// Wire the GitHub publishers to the build server
    pub fn new(
        options: &AppOptions,
        notifier: Arc<dyn ProblemNotifier>,
        server: Arc<dyn BuildServer>,
    ) -> Self {
        let problems = Arc::new(ProblemTracker::new(notifier));
        let locks = Arc::new(KeyedLocks::new());
        let scheduler = Arc::new(StatusScheduler::new());

        let services = Arc::new(GitHubServices {
            problems: problems.clone(),
            locks: locks.clone(),
            scheduler: scheduler.clone(),
            server: server.clone(),
            connection_timeout: options.connection_timeout,
            test_connection_timeout: options.test_connection_timeout,
            user_agent: options.user_agent.clone(),
        });
        let settings: Vec<Arc<dyn PublisherSettings>> = vec![
            Arc::new(GitHubDeploymentsSettings::new(services.clone())),
            Arc::new(GitHubStatusSettings::new(services)),
        ];
        let manager = Arc::new(PublisherManager::new(settings));

        let runner = Arc::new(TaskRunner::new(
            PublisherService::new(manager.clone()),
            problems.clone(),
            server.clone(),
            &options.runner,
        ));
        let listener = Arc::new(DeploymentsStatusListener::new(runner, server));

        Self {
            listener,
            manager,
            problems,
            scheduler,
            locks,
        }
    }

    /// Run the test-connection flow of a publisher
    pub async fn test_connection(
        &self,
        publisher_id: &str,
        build_type: &BuildConfiguration,
        root: &VcsRoot,
        params: &HashMap<String, String>,
    ) -> Result<(), PublisherError> {
        let settings = self
            .manager
            .find_settings(publisher_id)
            .ok_or_else(|| PublisherError::NotFound(format!("publisher {}", publisher_id)))?;
        if !settings.is_test_connection_supported() {
            return Err(PublisherError::ConfigError(format!(
                "Test connection functionality is not supported by {} publisher",
                settings.name()
            )));
        }
        settings.test_connection(build_type, root, params).await
    }

    /// Wait for scheduled status updates
    pub async fn shutdown(&self) {
        info!("Shutting down, {} status update(s) pending", self.scheduler.pending());
        self.scheduler.drain().await;
        info!("Shutdown complete");
    }
}
