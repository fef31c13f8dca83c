//! Settings file management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Publisher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Extra tracing filter directives
    #[serde(default)]
    pub log_directives: Option<String>,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,

    /// Server-wide publishing switch, overridable per build configuration
    #[serde(default = "default_true")]
    pub publishing_enabled: bool,

    /// Connect/read/write timeout for GitHub calls in milliseconds, `0` for the default
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Timeout for test-connection calls in seconds
    #[serde(default = "default_test_connection_timeout_secs")]
    pub test_connection_timeout_secs: u64,

    /// Number of builds remembered by the event ordering gate
    #[serde(default = "default_event_history_capacity")]
    pub event_history_capacity: u64,

    /// User agent sent to GitHub
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_true() -> bool {
    true
}

fn default_connection_timeout_ms() -> u64 {
    300 * 1000
}

fn default_test_connection_timeout_secs() -> u64 {
    10
}

fn default_event_history_capacity() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    format!("deployments-status-publisher/{}", env!("CARGO_PKG_VERSION"))
}

impl Settings {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn test_connection_timeout(&self) -> Duration {
        Duration::from_secs(self.test_connection_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_directives: None,
            json_logs: false,
            publishing_enabled: true,
            connection_timeout_ms: default_connection_timeout_ms(),
            test_connection_timeout_secs: default_test_connection_timeout_secs(),
            event_history_capacity: default_event_history_capacity(),
            user_agent: default_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.log_level, LogLevel::Info);
        assert!(settings.publishing_enabled);
        assert_eq!(settings.connection_timeout(), Duration::from_secs(300));
        assert_eq!(settings.test_connection_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_settings() {
        let settings: Settings =
            serde_json::from_str(r#"{"log_level": "debug", "publishing_enabled": false}"#).unwrap();
        assert_eq!(settings.log_level, LogLevel::Debug);
        assert!(!settings.publishing_enabled);
        assert_eq!(settings.event_history_capacity, 10_000);
    }
}
