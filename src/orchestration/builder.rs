//! Fluent construction of a [`SelfHealingCache`]

use super::core::SelfHealingCache;
use super::types::{into_refresh_fn, RefreshFn};
use crate::cache::{MemoryStore, StorageAdapter};
use crate::config::{BackoffConfig, CacheConfig};
use crate::error::{BoxError, CacheResult};
use crate::resilience::{CircuitBreakerConfig, RecoveryConfig, RecoveryStrategy};
use std::future::Future;
use std::time::Duration;

/// Builder pattern for creating caches with fluent API
pub struct SelfHealingCacheBuilder<V> {
    config: CacheConfig,
    refresh_fn: Option<RefreshFn<V>>,
}

impl<V> Default for SelfHealingCacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SelfHealingCacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::from_config(CacheConfig::default())
    }

    /// Start from a loaded configuration
    pub fn from_config(config: CacheConfig) -> Self {
        Self {
            config,
            refresh_fn: None,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.config.max_entries = max_entries;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_prediction_threshold(mut self, threshold: f64) -> Self {
        self.config.prediction_threshold = threshold;
        self
    }

    pub fn with_ml(mut self, enabled: bool) -> Self {
        self.config.enable_ml = enabled;
        self
    }

    pub fn with_adaptive_recovery(mut self, enabled: bool) -> Self {
        self.config.enable_adaptive_recovery = enabled;
        self
    }

    pub fn with_max_refresh_attempts(mut self, attempts: u32) -> Self {
        self.config.max_refresh_attempts = attempts;
        self
    }

    pub fn with_ml_sampling_interval(mut self, every_n_requests: u64) -> Self {
        self.config.ml_sampling_interval = every_n_requests;
        self
    }

    pub fn with_outcome_resolution_delay(mut self, delay: Duration) -> Self {
        self.config.outcome_resolution_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_default_strategy(mut self, strategy: RecoveryStrategy) -> Self {
        self.config.default_strategy = strategy.as_str().to_string();
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.config.backoff = backoff;
        self
    }

    pub fn with_recovery_config(mut self, recovery: RecoveryConfig) -> Self {
        self.config.recovery = recovery;
        self
    }

    pub fn with_circuit_breaker_config(mut self, circuit_breaker: CircuitBreakerConfig) -> Self {
        self.config.circuit_breaker = circuit_breaker;
        self
    }

    /// Set the upstream loader used on misses and during recovery
    pub fn with_refresh_function<F, Fut>(mut self, refresh: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<V>, BoxError>> + Send + 'static,
    {
        self.refresh_fn = Some(into_refresh_fn(refresh));
        self
    }

    /// Build a cache backed by the in-memory store
    pub fn build(self) -> CacheResult<SelfHealingCache<V>> {
        let default_ttl = (self.config.default_ttl_ms > 0).then(|| self.config.default_ttl());
        let storage = MemoryStore::new(self.config.max_entries, default_ttl);
        SelfHealingCache::assemble(self.config, storage, self.refresh_fn)
    }

    /// Build a cache backed by a custom storage adapter
    pub fn build_with_storage<S>(self, storage: S) -> CacheResult<SelfHealingCache<V, S>>
    where
        S: StorageAdapter<V> + 'static,
    {
        SelfHealingCache::assemble(self.config, storage, self.refresh_fn)
    }
}
