//! Reqwest-based HTTP client for the beatgraph backends.

use std::sync::Arc;

use beatgraph_core::{GraphStore, JobService};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ReqwestConfig;
use crate::error::{Error, Result};
use crate::TRACING_TARGET;

/// Longest response body kept in a status error.
const MAX_ERROR_BODY: usize = 1024;

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client for the job service and the graph store.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot hold a path or the HTTP
    /// client cannot be created.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        if config.base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(config.base_url.to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()?;

        let inner = ReqwestClientInner { http, config };
        let client = Self {
            inner: Arc::new(inner),
        };

        tracing::info!(
            target: TRACING_TARGET,
            "Reqwest client created successfully"
        );

        Ok(client)
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a [`JobService`].
    pub fn into_job_service(self) -> JobService {
        JobService::new(self)
    }

    /// Converts this client into a [`GraphStore`].
    pub fn into_graph_store(self) -> GraphStore {
        GraphStore::new(self)
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Builds the URL of an endpoint below the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl(self.inner.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and decodes a JSON response body.
    pub(crate) async fn send_json<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = Self::checked(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Sends a request and discards the response body.
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        Self::checked(request).await?;
        Ok(())
    }

    async fn checked(request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .map(|body| body.chars().take(MAX_ERROR_BODY).collect())
            .unwrap_or_default();
        Err(Error::Status { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ReqwestClient {
        ReqwestClient::new(ReqwestConfig::new(Url::parse(base_url).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_appends_to_base_path() {
        let client = client("https://api.example.com/v1/");
        let url = client.endpoint(&["jobs", "run-7"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/jobs/run-7");
    }

    #[test]
    fn test_endpoint_without_base_path() {
        let client = client("http://localhost:8080");
        let url = client.endpoint(&["graphs"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/graphs");
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = client("http://localhost:8080");
        let url = client.endpoint(&["jobs", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/jobs/a%2Fb%20c");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let config = ReqwestConfig::new(Url::parse("mailto:ops@example.com").unwrap());
        let error = ReqwestClient::new(config).unwrap_err();
        assert!(matches!(error, Error::InvalidBaseUrl(_)));
    }
}
