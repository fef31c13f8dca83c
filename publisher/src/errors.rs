//! Error types for the deployments status publisher

use thiserror::Error;

/// Hint appended to GitHub errors that usually come from a proxy or a missing permission
pub const MSG_PROXY_OR_PERMISSIONS: &str =
    "Please check if the error is not returned by a proxy or caused by the lack of permissions.";

/// Main error type for the deployments status publisher
#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Failed to complete request to GitHub. {hint}Status: {status}")]
    ApiError {
        status: http::StatusCode,
        hint: String,
        body: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    ConnectionError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PublisherError {
    /// Build an API error from a non-success GitHub response
    pub fn api(status: http::StatusCode, body: String) -> Self {
        PublisherError::ApiError {
            status,
            hint: format!("{} ", MSG_PROXY_OR_PERMISSIONS),
            body,
        }
    }

    /// Same as [`PublisherError::api`] without the proxy/permissions hint
    pub fn api_plain(status: http::StatusCode, body: String) -> Self {
        PublisherError::ApiError {
            status,
            hint: String::new(),
            body,
        }
    }

    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            PublisherError::ApiError { status, .. } => Some(*status),
            PublisherError::HttpError(e) => e.status(),
            _ => None,
        }
    }
}
