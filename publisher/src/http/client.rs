//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::PublisherError;

/// Default GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type for plain REST calls
pub const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Media type enabling the extended deployment status states
pub const ACCEPT_DEPLOYMENTS: &str =
    "application/vnd.github.ant-man-preview+json, application/vnd.github.flash-preview+json";

const API_VERSION: &str = "2022-11-28";

/// Client options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Connect/read/write timeout
    pub timeout: Duration,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(300 * 1000),
            user_agent: format!("deployments-status-publisher/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Token-authenticated HTTP client for the GitHub REST API
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(
        base_url: &str,
        token: SecretString,
        options: &ClientOptions,
    ) -> Result<Self, PublisherError> {
        // Reject malformed URLs before any request is built
        url::Url::parse(base_url)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-github-api-version",
            header::HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .user_agent(options.user_agent.clone())
            .default_headers(headers)
            .timeout(options.timeout)
            .connect_timeout(options.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder, accept: &str) -> RequestBuilder {
        request
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header(header::ACCEPT, accept)
    }

    /// Make a GET request, expecting `200 OK`
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        accept: &str,
    ) -> Result<T, PublisherError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request = self.authorized(self.client.get(&url), accept).query(query);
        let response = request.send().await?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(PublisherError::api(status, body));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request, expecting `201 Created`
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        accept: &str,
    ) -> Result<T, PublisherError> {
        let (status, text) = self.post_raw(path, body, accept).await?;

        if status != StatusCode::CREATED {
            return Err(PublisherError::api(status, text));
        }

        let body = serde_json::from_str(&text)?;
        Ok(body)
    }

    /// Make a POST request and hand back the raw status and body
    pub async fn post_raw<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        accept: &str,
    ) -> Result<(StatusCode, String), PublisherError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let request = self.authorized(self.client.post(&url), accept).json(body);
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status != StatusCode::CREATED {
            error!("HTTP POST failed: {} - {}", status, text);
        }
        Ok((status, text))
    }
}
