#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;
mod service;

pub use crate::client::ReqwestClient;
pub use crate::config::{DEFAULT_HTTP_TIMEOUT_SECS, ReqwestConfig};
pub use crate::error::{Error, Result};

/// Tracing target for HTTP client operations.
pub const TRACING_TARGET: &str = "beatgraph_reqwest::client";
