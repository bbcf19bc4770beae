//! # Resilience Configuration
//!
//! Tuning for the circuit breaker and the refresh-based recovery strategies.
//! Defaults are the empirically tuned values from [`crate::constants::recovery`].

use crate::config::{ConfigResult, ConfigurationError};
use crate::constants::recovery;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Circuit breaker timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Time after which an open breaker closes on its own
    pub timeout_ms: u64,

    /// Wait between opening the breaker and probing
    pub stabilization_ms: u64,

    /// Keys refreshed as a probe before closing
    pub probe_keys: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: recovery::CIRCUIT_BREAKER_TIMEOUT_MS,
            stabilization_ms: recovery::CIRCUIT_BREAKER_STABILIZATION_MS,
            probe_keys: recovery::CIRCUIT_BREAKER_PROBE_KEYS,
        }
    }
}

impl CircuitBreakerConfig {
    /// Configuration with short timings, for tests and simulations
    pub fn fast() -> Self {
        Self {
            timeout_ms: 200,
            stabilization_ms: 10,
            probe_keys: recovery::CIRCUIT_BREAKER_PROBE_KEYS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn stabilization(&self) -> Duration {
        Duration::from_millis(self.stabilization_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.timeout_ms",
                self.timeout_ms,
                "timeout must be greater than 0",
            ));
        }

        if self.timeout_ms > 300_000 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.timeout_ms",
                self.timeout_ms,
                "timeout should not exceed 300 seconds",
            ));
        }

        if self.stabilization_ms >= self.timeout_ms {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.stabilization_ms",
                self.stabilization_ms,
                "stabilization must be shorter than the open timeout",
            ));
        }

        if self.probe_keys == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.probe_keys",
                self.probe_keys,
                "at least one probe key is required",
            ));
        }

        Ok(())
    }
}

/// Caps, batch sizes and per-key limits for refresh strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub immediate_max_keys: usize,
    pub immediate_batch_size: usize,
    pub immediate_batch_pause_ms: u64,

    pub gradual_max_keys: usize,
    pub gradual_batch_size: usize,
    pub gradual_batch_pause_ms: u64,

    /// Failures within the window after which a key is skipped
    pub max_key_failures: u32,
    pub key_failure_window_ms: u64,

    /// Recovery actions retained in history
    pub history_limit: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            immediate_max_keys: recovery::IMMEDIATE_MAX_KEYS,
            immediate_batch_size: recovery::IMMEDIATE_BATCH_SIZE,
            immediate_batch_pause_ms: recovery::IMMEDIATE_BATCH_PAUSE_MS,
            gradual_max_keys: recovery::GRADUAL_MAX_KEYS,
            gradual_batch_size: recovery::GRADUAL_BATCH_SIZE,
            gradual_batch_pause_ms: recovery::GRADUAL_BATCH_PAUSE_MS,
            max_key_failures: recovery::MAX_KEY_FAILURES,
            key_failure_window_ms: recovery::KEY_FAILURE_WINDOW_MS,
            history_limit: recovery::HISTORY_LIMIT,
        }
    }
}

impl RecoveryConfig {
    /// Default caps and batch sizes with short pauses
    pub fn fast() -> Self {
        Self {
            immediate_batch_pause_ms: 5,
            gradual_batch_pause_ms: 10,
            ..Self::default()
        }
    }

    pub fn key_failure_window(&self) -> Duration {
        Duration::from_millis(self.key_failure_window_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let batch_sizes = [
            ("recovery.immediate_batch_size", self.immediate_batch_size),
            ("recovery.gradual_batch_size", self.gradual_batch_size),
        ];
        for (field, value) in batch_sizes {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value,
                    "batch size must be greater than 0",
                ));
            }
        }

        if self.max_key_failures == 0 {
            return Err(ConfigurationError::invalid_value(
                "recovery.max_key_failures",
                self.max_key_failures,
                "keys must be allowed at least one failure",
            ));
        }

        if self.history_limit == 0 {
            return Err(ConfigurationError::invalid_value(
                "recovery.history_limit",
                self.history_limit,
                "history must retain at least one action",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let breaker = CircuitBreakerConfig::default();
        assert_eq!(breaker.timeout(), Duration::from_secs(30));
        assert_eq!(breaker.probe_keys, 5);
        assert!(breaker.validate().is_ok());

        let recovery = RecoveryConfig::default();
        assert_eq!(recovery.immediate_max_keys, 20);
        assert_eq!(recovery.immediate_batch_size, 5);
        assert_eq!(recovery.gradual_max_keys, 15);
        assert_eq!(recovery.gradual_batch_size, 3);
        assert!(recovery.validate().is_ok());

        assert!(CircuitBreakerConfig::fast().validate().is_ok());
        assert!(RecoveryConfig::fast().validate().is_ok());
    }

    #[test]
    fn test_invalid_circuit_breaker_config() {
        let config = CircuitBreakerConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CircuitBreakerConfig {
            stabilization_ms: 30_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CircuitBreakerConfig {
            probe_keys: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_recovery_config() {
        let config = RecoveryConfig {
            gradual_batch_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("recovery.gradual_batch_size"));
    }
}
