//! Configuration for the reqwest client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for HTTP requests, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration for the reqwest HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Root URL of the job service and graph store API.
    #[cfg_attr(
        feature = "config",
        arg(long = "job-url", env = "BEATGRAPH_JOB_URL")
    )]
    pub base_url: Url,

    /// Timeout for each HTTP request, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "BEATGRAPH_HTTP_TIMEOUT", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)
    )]
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// User-Agent header sent with every request.
    #[cfg_attr(feature = "config", arg(long = "user-agent", env = "BEATGRAPH_USER_AGENT"))]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl ReqwestConfig {
    /// Creates a configuration for the API rooted at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http_timeout: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: None,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout.as_secs();
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using the default if unset or empty.
    pub fn effective_user_agent(&self) -> String {
        match self.user_agent.as_deref() {
            Some(user_agent) if !user_agent.is_empty() => user_agent.to_owned(),
            _ => format!("beatgraph/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
