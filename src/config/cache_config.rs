//! Derived-Cost Cache Configuration
//!
//! Environment-specific settings for the read-through cache and the
//! invalidation dispatcher. Cached values never expire on a timer; the only
//! knobs are the backend, purge retry behaviour and the size of embedded
//! lists in composite views.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::error::{ConfigResult, ConfigurationError};

/// Backends understood by [`crate::cache::CacheProvider::from_config`]
pub const KNOWN_BACKENDS: &[&str] = &["memory", "in-memory", "noop"];

/// Configuration for derived-cost cache behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// "memory" (in-process, tag indexed) or "noop" (always miss)
    pub backend: String,
    /// Attempts made to purge a tag set before the failure is logged and dropped
    pub purge_retry_attempts: u32,
    /// Linear backoff between purge attempts
    pub purge_retry_backoff_ms: u64,
    /// Number of most recent battles embedded in a campaign overview
    pub campaign_battle_limit: u32,
}

impl Default for CacheConfig {
    /// Default configuration suitable for production
    fn default() -> Self {
        Self {
            enabled: true,
            backend: "memory".to_string(),
            purge_retry_attempts: 3,
            purge_retry_backoff_ms: 50,
            campaign_battle_limit: 10,
        }
    }
}

impl CacheConfig {
    /// Create test-optimized configuration with near-instant retries
    pub fn for_test() -> Self {
        Self {
            purge_retry_attempts: 2,
            purge_retry_backoff_ms: 1,
            ..Self::default()
        }
    }

    /// Create development-optimized configuration
    pub fn for_development() -> Self {
        Self {
            purge_retry_attempts: 2,
            purge_retry_backoff_ms: 10,
            ..Self::default()
        }
    }

    /// Presets keyed by environment name
    pub fn for_environment(environment: &str) -> Self {
        match environment {
            "test" => Self::for_test(),
            "development" => Self::for_development(),
            _ => Self::default(),
        }
    }

    /// Check if caching is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get purge backoff as Duration
    pub fn purge_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.purge_retry_backoff_ms)
    }

    /// Log current configuration for debugging
    pub fn log_configuration(&self) {
        info!(
            enabled = self.enabled,
            backend = %self.backend,
            purge_retry_attempts = self.purge_retry_attempts,
            purge_retry_backoff_ms = self.purge_retry_backoff_ms,
            campaign_battle_limit = self.campaign_battle_limit,
            "Derived-cost cache configuration"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if !KNOWN_BACKENDS.contains(&self.backend.as_str()) {
            return Err(ConfigurationError::invalid_value(
                "cache.backend",
                self.backend.clone(),
                format!("expected one of {KNOWN_BACKENDS:?}"),
            ));
        }

        if self.purge_retry_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.purge_retry_attempts",
                "0",
                "at least one purge attempt is required",
            ));
        }

        if self.campaign_battle_limit == 0 {
            warn!("Campaign battle limit is 0 - campaign overviews will embed no battles");
        }

        if self.enabled && self.backend == "noop" {
            warn!("Cache enabled with the noop backend - every read recomputes");
        }

        Ok(())
    }
}
