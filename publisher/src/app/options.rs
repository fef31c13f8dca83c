//! Application configuration options

use std::time::Duration;

use crate::dispatch::runner;
use crate::publisher::DEFAULT_CONNECTION_TIMEOUT;
use crate::storage::settings::Settings;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Task runner options
    pub runner: runner::Options,

    /// Timeout for status publishing calls
    pub connection_timeout: Duration,

    /// Timeout for test-connection calls
    pub test_connection_timeout: Duration,

    /// User agent sent to GitHub
    pub user_agent: String,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            runner: runner::Options {
                publishing_enabled: settings.publishing_enabled,
                event_history_capacity: settings.event_history_capacity,
            },
            connection_timeout: Some(settings.connection_timeout())
                .filter(|t| !t.is_zero())
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT),
            test_connection_timeout: settings.test_connection_timeout(),
            user_agent: settings.user_agent.clone(),
        }
    }
}
