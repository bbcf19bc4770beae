//! # Cache Configuration
//!
//! Immutable configuration fixed at construction time. Every field has a
//! documented default so a partial file (or none at all) is valid input.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use self_healing_cache::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // File is optional; SELF_HEALING_CACHE__* variables override it
//! let manager = ConfigManager::load_from_file("self-healing-cache.toml")?;
//!
//! let capacity = manager.config().max_entries;
//! let interval = manager.config().health_check_interval();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{orchestration, system};
use crate::resilience::{CircuitBreakerConfig, RecoveryConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration for a [`crate::SelfHealingCache`]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction
    pub max_entries: usize,

    /// TTL applied when `set` is called without one
    pub default_ttl_ms: u64,

    /// Period of the background health check
    pub health_check_interval_ms: u64,

    /// Probability and confidence the predictor must reach before its
    /// recommended strategy is trusted
    pub prediction_threshold: f64,

    /// Enable the online failure predictor
    pub enable_ml: bool,

    /// Let the health check trigger self-healing on its own
    pub enable_adaptive_recovery: bool,

    /// Refresh calls per `get` miss before the upstream error is surfaced
    pub max_refresh_attempts: u32,

    /// Every Nth request runs an ML sampling step
    pub ml_sampling_interval: u64,

    /// Delay before a prediction is checked against what actually happened
    pub outcome_resolution_delay_ms: u64,

    /// Strategy used when the predictor's recommendation is not trusted
    pub default_strategy: String,

    /// Delays between refresh attempts
    pub backoff: BackoffConfig,

    /// Recovery batch sizes, caps and per-key limits
    pub recovery: RecoveryConfig,

    /// Circuit breaker timing
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: system::DEFAULT_MAX_ENTRIES,
            default_ttl_ms: system::DEFAULT_TTL_MS,
            health_check_interval_ms: system::DEFAULT_HEALTH_CHECK_INTERVAL_MS,
            prediction_threshold: system::DEFAULT_PREDICTION_THRESHOLD,
            enable_ml: true,
            enable_adaptive_recovery: true,
            max_refresh_attempts: orchestration::DEFAULT_MAX_REFRESH_ATTEMPTS,
            ml_sampling_interval: orchestration::DEFAULT_ML_SAMPLING_INTERVAL,
            outcome_resolution_delay_ms: orchestration::DEFAULT_OUTCOME_RESOLUTION_DELAY_MS,
            default_strategy: "ADAPTIVE".to_string(),
            backoff: BackoffConfig::default(),
            recovery: RecoveryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    pub fn outcome_resolution_delay(&self) -> Duration {
        Duration::from_millis(self.outcome_resolution_delay_ms)
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_entries == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_entries",
                self.max_entries,
                "capacity must be greater than 0",
            ));
        }

        if self.health_check_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "health_check_interval_ms",
                self.health_check_interval_ms,
                "interval must be greater than 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.prediction_threshold) {
            return Err(ConfigurationError::invalid_value(
                "prediction_threshold",
                self.prediction_threshold,
                "threshold must be within [0, 1]",
            ));
        }

        if self.max_refresh_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_refresh_attempts",
                self.max_refresh_attempts,
                "at least one refresh attempt is required",
            ));
        }

        if self.ml_sampling_interval == 0 {
            return Err(ConfigurationError::invalid_value(
                "ml_sampling_interval",
                self.ml_sampling_interval,
                "sampling interval must be greater than 0",
            ));
        }

        self.backoff.validate()?;
        self.recovery.validate()?;
        self.circuit_breaker.validate()?;

        Ok(())
    }
}

/// Backoff between refresh attempts on the request path
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the second attempt
    pub base_delay_ms: u64,
    /// Growth factor per further attempt
    pub multiplier: f64,
    /// Upper bound for any single delay
    pub max_delay_ms: u64,
    /// Randomise delays to avoid synchronised retries
    pub jitter_enabled: bool,
    /// Maximum jitter as a fraction of the delay (0.0 to 1.0)
    pub max_jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: orchestration::DEFAULT_RETRY_BASE_DELAY_MS,
            multiplier: 2.0,
            max_delay_ms: 5_000,
            jitter_enabled: false,
            max_jitter: 0.1,
        }
    }
}

impl BackoffConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.multiplier < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "backoff.multiplier",
                self.multiplier,
                "delays must not shrink between attempts",
            ));
        }

        if !(0.0..=1.0).contains(&self.max_jitter) {
            return Err(ConfigurationError::invalid_value(
                "backoff.max_jitter",
                self.max_jitter,
                "jitter must be within [0, 1]",
            ));
        }

        Ok(())
    }
}
