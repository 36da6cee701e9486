//! Run tracking configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default pause between status checks: 2 seconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default limit on how long a run may stay unfinished: 15 minutes.
pub const DEFAULT_MAX_POLL_SECS: u64 = 15 * 60;

/// Configuration for [`RunTracker`](super::RunTracker).
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RunConfig {
    /// Pause between status checks, in milliseconds
    #[builder(default = "DEFAULT_POLL_INTERVAL_MS")]
    #[serde(default = "default_poll_interval_ms")]
    #[cfg_attr(
        feature = "config",
        arg(long = "poll-interval-ms", env = "POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)
    )]
    pub poll_interval_ms: u64,

    /// Seconds after which an unfinished run is failed, 0 to wait forever
    #[builder(default = "DEFAULT_MAX_POLL_SECS")]
    #[serde(default = "default_max_poll_secs")]
    #[cfg_attr(
        feature = "config",
        arg(long = "max-poll-secs", env = "MAX_POLL_SECS", default_value_t = DEFAULT_MAX_POLL_SECS)
    )]
    pub max_poll_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_poll_secs() -> u64 {
    DEFAULT_MAX_POLL_SECS
}

impl RunConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == Some(0) {
            return Err("poll_interval_ms must be at least 1".into());
        }
        Ok(())
    }
}

impl RunConfig {
    /// Returns the pause between status checks.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Returns how long a run may stay unfinished, `None` for no limit.
    pub fn max_poll_duration(&self) -> Option<Duration> {
        (self.max_poll_secs > 0).then(|| Duration::from_secs(self.max_poll_secs))
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_poll_secs: DEFAULT_MAX_POLL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.max_poll_duration(), Some(Duration::from_secs(900)));
        assert_eq!(RunConfigBuilder::default().build().unwrap(), config);
    }

    #[test]
    fn test_zero_limit_disables_timeout() {
        let config = RunConfigBuilder::default()
            .max_poll_secs(0u64)
            .build()
            .unwrap();
        assert!(config.max_poll_duration().is_none());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result = RunConfigBuilder::default().poll_interval_ms(0u64).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_sparse_file_config() {
        let config: RunConfig = serde_json::from_str(r#"{"poll_interval_ms": 500}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.max_poll_secs, DEFAULT_MAX_POLL_SECS);
    }
}
