//! Logging configuration
//!
//! Publisher modules log at the configured level, third-party crates
//! (reqwest, hyper, httpmock) only from `warn` up. `RUST_LOG` replaces the
//! whole filter.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::PublisherError;
use crate::storage::settings::Settings;

/// Targets that follow the configured level
const PUBLISHER_TARGETS: [&str; 2] = ["deployments_status_publisher", "dsp"];

/// Log level configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = PublisherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(PublisherError::ConfigError(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging options
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Level of the publisher's own modules
    pub level: LogLevel,

    /// Extra filter directives, e.g. `deployments_status_publisher::http=trace`
    pub directives: Option<String>,

    /// Emit JSON lines
    pub json: bool,
}

impl From<&Settings> for LogOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            level: settings.log_level,
            directives: settings.log_directives.clone(),
            json: settings.json_logs,
        }
    }
}

impl LogOptions {
    /// Apply a `--log-level` command line override
    pub fn with_level_override(mut self, level: Option<&str>) -> Result<Self, PublisherError> {
        if let Some(level) = level {
            self.level = level.parse()?;
        }
        Ok(self)
    }

    /// Filter directives built from the options
    pub fn filter(&self) -> String {
        let mut directives = vec![LogLevel::Warn.as_str().to_string()];
        directives.extend(
            PUBLISHER_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, self.level.as_str())),
        );
        if let Some(extra) = self.directives.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            directives.push(extra.to_string());
        }
        directives.join(",")
    }
}

/// Initialize logging
pub fn init_logging(options: &LogOptions) -> Result<(), PublisherError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(options.filter())
            .map_err(|e| PublisherError::ConfigError(format!("Invalid log filter: {}", e)))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if options.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    result.map_err(|e| PublisherError::ConfigError(e.to_string()))
}
