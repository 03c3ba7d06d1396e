//! # Cache Configuration
//!
//! Environment-based configuration for the cache facade.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

const URL_SCHEMES: &[&str] = &["redis://", "rediss://", "redis+unix://", "unix://"];

/// Redis cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backend URL
    pub url: String,

    /// How long one connection attempt may take
    pub connect_timeout: Duration,

    /// How often the health monitor pings the backend. Zero disables it.
    pub health_check_interval: Duration,

    /// Capacity of the lifecycle event broadcast channel
    pub event_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connect_timeout: Duration::from_secs(2),
            health_check_interval: Duration::from_secs(5),
            event_capacity: 64,
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            url: env::var("REDIS_URL").unwrap_or(defaults.url),

            connect_timeout: env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.connect_timeout, Duration::from_secs),

            health_check_interval: env::var("REDIS_HEALTH_CHECK_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.health_check_interval, Duration::from_secs),

            event_capacity: env::var("REDIS_EVENT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.event_capacity),
        }
    }

    /// Override the backend URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Override the health check interval
    #[must_use]
    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Check the configuration before any connection is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] for an unsupported URL scheme, a zero
    /// connect timeout or a zero event capacity.
    pub fn validate(&self) -> Result<()> {
        if !URL_SCHEMES.iter().any(|scheme| self.url.starts_with(scheme)) {
            return Err(CacheError::Config(format!(
                "unsupported URL scheme in '{}'",
                self.url
            )));
        }
        if self.connect_timeout.is_zero() {
            return Err(CacheError::Config(
                "connect timeout must be greater than zero".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(CacheError::Config(
                "event capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the background health monitor should run
    #[must_use]
    pub const fn monitor_enabled(&self) -> bool {
        !self.health_check_interval.is_zero()
    }
}
