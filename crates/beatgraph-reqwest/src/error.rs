//! Internal error types for beatgraph-reqwest.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for beatgraph-reqwest operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Internal error type for beatgraph-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The configured base URL cannot have path segments.
    #[error("Base URL cannot be a base: {0}")]
    InvalidBaseUrl(String),
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, truncated.
        body: String,
    },
}

impl From<Error> for beatgraph_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    beatgraph_core::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    beatgraph_core::Error::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_builder() {
                    beatgraph_core::Error::configuration()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_decode() {
                    beatgraph_core::Error::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    beatgraph_core::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => beatgraph_core::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::InvalidBaseUrl(url) => beatgraph_core::Error::configuration()
                .with_message(format!("Base URL cannot be a base: {url}")),
            Error::Status { status, body } => {
                let error = match status {
                    StatusCode::NOT_FOUND => beatgraph_core::Error::not_found(),
                    StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                        beatgraph_core::Error::timeout()
                    }
                    StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE => {
                        beatgraph_core::Error::service_unavailable()
                    }
                    status if status.is_client_error() => beatgraph_core::Error::invalid_input(),
                    _ => beatgraph_core::Error::external_error(),
                };
                error.with_message(format!("HTTP {status}: {body}"))
            }
        }
    }
}
