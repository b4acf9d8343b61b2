//! Supervisor tunables.

use super::BackoffPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Timing and retry configuration for a connection supervisor.
///
/// All durations are stored in milliseconds so the struct deserialises from
/// flat configuration documents; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Delay after the first failed try.
    pub initial_backoff_ms: u64,
    /// Upper bound for any backoff delay.
    pub max_backoff_ms: u64,
    /// Total number of tries per connect series.
    pub max_retries: u32,
    /// Bound on the existing-server lookup.
    pub connection_timeout_ms: u64,
    /// Minimum spacing between `reconnect` invocations.
    pub min_reconnect_interval_ms: u64,
    /// Period of the liveness probe while connected.
    pub health_check_interval_ms: u64,
    /// Window in which repeated failure notices are suppressed.
    pub failure_notice_cooldown_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            max_retries: 3,
            connection_timeout_ms: 10_000,
            min_reconnect_interval_ms: 5_000,
            health_check_interval_ms: 30_000,
            failure_notice_cooldown_ms: 10_000,
        }
    }
}

impl SupervisorConfig {
    /// Creates a configuration with short intervals.
    ///
    /// Useful for local development against a tool server on the same host.
    #[must_use]
    pub const fn aggressive() -> Self {
        Self {
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
            max_retries: 5,
            connection_timeout_ms: 2_000,
            min_reconnect_interval_ms: 500,
            health_check_interval_ms: 5_000,
            failure_notice_cooldown_ms: 2_000,
        }
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the validation
    /// errors of [`Self::validate`].
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the tunables describe a usable retry schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when retries are zero, the backoff bounds are
    /// inverted, or a periodic interval is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ConfigError::InvertedBackoff {
                initial_ms: self.initial_backoff_ms,
                max_ms: self.max_backoff_ms,
            });
        }
        if self.health_check_interval_ms == 0 {
            return Err(ConfigError::ZeroHealthCheckInterval);
        }
        if self.connection_timeout_ms == 0 {
            return Err(ConfigError::ZeroConnectionTimeout);
        }
        Ok(())
    }

    /// Returns the backoff schedule.
    #[must_use]
    pub const fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }

    /// Returns the lookup timeout.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Returns the minimum spacing between reconnects.
    #[must_use]
    pub const fn min_reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.min_reconnect_interval_ms)
    }

    /// Returns the health-check period.
    #[must_use]
    pub const fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    /// Returns the failure-notice suppression window.
    #[must_use]
    pub const fn failure_notice_cooldown(&self) -> Duration {
        Duration::from_millis(self.failure_notice_cooldown_ms)
    }
}

/// Errors returned for unusable supervisor configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The document could not be parsed.
    #[error("invalid supervisor configuration document: {0}")]
    Parse(String),

    /// At least one try is required per connect series.
    #[error("max_retries must be at least 1")]
    ZeroRetries,

    /// The initial backoff exceeds the cap.
    #[error("initial backoff ({initial_ms}ms) exceeds max backoff ({max_ms}ms)")]
    InvertedBackoff {
        /// Configured initial backoff.
        initial_ms: u64,
        /// Configured backoff cap.
        max_ms: u64,
    },

    /// A zero health-check period would spin.
    #[error("health check interval must be greater than zero")]
    ZeroHealthCheckInterval,

    /// A zero lookup timeout fails every try.
    #[error("connection timeout must be greater than zero")]
    ZeroConnectionTimeout,
}
