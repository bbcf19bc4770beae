//! Shared fixtures for integration tests
#![allow(dead_code)]

pub mod upstream;

pub use upstream::*;

use self_healing_cache::{BackoffConfig, CacheConfig, CircuitBreakerConfig, RecoveryConfig};

/// Config with millisecond-scale timings so tests stay fast
pub fn fast_config() -> CacheConfig {
    CacheConfig {
        max_entries: 100,
        health_check_interval_ms: 20,
        outcome_resolution_delay_ms: 0,
        backoff: BackoffConfig {
            base_delay_ms: 1,
            max_delay_ms: 5,
            ..Default::default()
        },
        recovery: RecoveryConfig::fast(),
        circuit_breaker: CircuitBreakerConfig::fast(),
        ..Default::default()
    }
}
