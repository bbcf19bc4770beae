//! Request-path behaviour of the cache through its public API

mod common;

use async_trait::async_trait;
use common::{fast_config, refresh_from, ScriptedUpstream};
use self_healing_cache::{
    BoxError, CacheConfig, CacheError, CacheResult, CacheState, HealthMetrics, KeyRefresher,
    RecoveryStrategy, SelfHealingCache, SelfHealingCacheBuilder, StorageAdapter,
};
use std::time::Duration;

struct AlwaysFails;

#[async_trait]
impl KeyRefresher for AlwaysFails {
    async fn refresh(&self, key: &str) -> Result<(), BoxError> {
        Err(format!("probe failed for {key}").into())
    }
}

fn cache_with(config: CacheConfig) -> SelfHealingCache<String> {
    SelfHealingCache::new(config).unwrap()
}

#[tokio::test]
async fn test_refresh_exhausts_attempt_budget() {
    let upstream = ScriptedUpstream::new();
    upstream.fail_next("k", 2);

    let cache = cache_with(CacheConfig {
        max_refresh_attempts: 2,
        ..fast_config()
    });
    cache.set_refresh_function(refresh_from(&upstream));

    let err = cache.get("k").await.unwrap_err();
    assert!(err.is_upstream());
    assert!(matches!(err, CacheError::UpstreamFailure { attempts: 2, .. }));
    assert_eq!(upstream.calls(), 2);
    assert_eq!(cache.monitor().counters().errors, 1);
    assert_eq!(cache.monitor().counters().misses, 1);
}

#[tokio::test]
async fn test_refresh_succeeds_within_attempt_budget() {
    let upstream = ScriptedUpstream::new();
    upstream.fail_next("k", 2);

    let cache = cache_with(CacheConfig {
        max_refresh_attempts: 3,
        ..fast_config()
    });
    cache.set_refresh_function(refresh_from(&upstream));

    assert_eq!(cache.get("k").await.unwrap(), Some("fresh:k".to_string()));
    assert_eq!(upstream.calls(), 3);
    assert_eq!(cache.monitor().counters().errors, 0);

    // Stored, so the next read is a hit without touching upstream
    assert_eq!(cache.get("k").await.unwrap(), Some("fresh:k".to_string()));
    assert_eq!(upstream.calls(), 3);
}

#[tokio::test]
async fn test_absent_upstream_key_is_a_plain_miss() {
    let upstream = ScriptedUpstream::new();
    upstream.remove("gone");

    let cache = cache_with(fast_config());
    cache.set_refresh_function(refresh_from(&upstream));

    assert_eq!(cache.get("gone").await.unwrap(), None);
    assert_eq!(upstream.calls(), 1);
    assert_eq!(cache.storage().size(), 0);
    assert_eq!(cache.monitor().counters().errors, 0);
}

#[tokio::test]
async fn test_entries_expire_after_ttl() {
    let cache = cache_with(fast_config());
    cache
        .set("short", "v".to_string(), Some(Duration::from_millis(20)))
        .await
        .unwrap();
    cache.set("long", "v".to_string(), None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(cache.get("short").await.unwrap(), None);
    assert_eq!(cache.get("long").await.unwrap(), Some("v".to_string()));
}

#[tokio::test]
async fn test_least_recently_used_entry_is_evicted() {
    let cache = cache_with(CacheConfig {
        max_entries: 3,
        ..fast_config()
    });

    for key in ["a", "b", "c"] {
        cache.set(key, key.to_string(), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    cache.get("a").await.unwrap();
    cache.set("d", "d".to_string(), None).await.unwrap();

    assert_eq!(cache.storage().size(), 3);
    assert!(cache.storage().has("a"));
    assert!(!cache.storage().has("b"));
    assert!(cache.storage().has("d"));
}

#[tokio::test]
async fn test_delete_and_clear() {
    let cache = cache_with(fast_config());
    cache.set("a", "1".to_string(), None).await.unwrap();
    cache.set("b", "2".to_string(), None).await.unwrap();

    assert!(cache.delete("a").await.unwrap());
    assert!(!cache.delete("a").await.unwrap());

    cache.clear().await.unwrap();
    assert_eq!(cache.stats().await.unwrap().size, 0);
}

#[tokio::test]
async fn test_open_circuit_short_circuits_reads() {
    let upstream = ScriptedUpstream::new();
    let cache = cache_with(fast_config());
    cache.set_refresh_function(refresh_from(&upstream));
    cache.set("cached", "v".to_string(), None).await.unwrap();

    let keys = vec!["cached".to_string()];
    let result = cache
        .recovery()
        .execute_recovery(
            RecoveryStrategy::CircuitBreaker,
            &keys,
            &AlwaysFails,
            &HealthMetrics::idle(),
        )
        .await;
    assert!(matches!(result, Err(CacheError::RecoveryFailed { .. })));
    assert!(cache.is_circuit_breaker_open());

    // Even a stored key is reported as a miss while the circuit is open
    assert_eq!(cache.get("cached").await.unwrap(), None);
    assert_eq!(cache.get("other").await.unwrap(), None);
    assert_eq!(upstream.calls(), 0);
    assert_eq!(cache.monitor().counters().errors, 2);
    assert_eq!(cache.health().await.state, CacheState::Critical);

    // Closes on its own once the timeout elapses
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!cache.is_circuit_breaker_open());
    assert_eq!(cache.get("cached").await.unwrap(), Some("v".to_string()));
}

#[tokio::test]
async fn test_disconnected_storage_surfaces_error() {
    let cache = cache_with(fast_config());
    StorageAdapter::<String>::disconnect(cache.storage())
        .await
        .unwrap();

    let err = cache.get("k").await.unwrap_err();
    assert!(matches!(err, CacheError::NotConnected));
    assert_eq!(cache.monitor().counters().errors, 1);

    StorageAdapter::<String>::connect(cache.storage())
        .await
        .unwrap();
    assert_eq!(cache.get("k").await.unwrap(), None);
}

/// Backend whose connection is always down
struct UnreachableStore;

impl UnreachableStore {
    fn down<T>() -> CacheResult<T> {
        Err(CacheError::Storage("connection refused".to_string()))
    }
}

impl StorageAdapter<String> for UnreachableStore {
    async fn connect(&self) -> CacheResult<()> {
        Self::down()
    }

    async fn disconnect(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> CacheResult<()> {
        Self::down()
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Self::down()
    }

    async fn has(&self, _key: &str) -> CacheResult<bool> {
        Self::down()
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        Self::down()
    }

    async fn clear(&self) -> CacheResult<()> {
        Self::down()
    }

    async fn size(&self) -> CacheResult<usize> {
        Self::down()
    }

    async fn keys(&self, _pattern: Option<&str>) -> CacheResult<Vec<String>> {
        Self::down()
    }

    async fn ping(&self) -> CacheResult<bool> {
        Ok(false)
    }

    fn provider_name(&self) -> &'static str {
        "unreachable"
    }
}

#[tokio::test]
async fn test_backend_storage_errors_reach_caller() {
    let upstream = ScriptedUpstream::new();
    let cache = SelfHealingCacheBuilder::<String>::from_config(fast_config())
        .build_with_storage(UnreachableStore)
        .unwrap();
    cache.set_refresh_function(refresh_from(&upstream));

    let err = cache.get("k").await.unwrap_err();
    assert!(matches!(err, CacheError::Storage(_)));
    assert!(err.to_string().contains("connection refused"));
    assert!(!err.is_upstream());
    // The upstream is never consulted when the backend itself fails
    assert_eq!(upstream.calls(), 0);
    assert_eq!(cache.monitor().counters().errors, 1);

    let err = cache.set("k", "v".to_string(), None).await.unwrap_err();
    assert!(matches!(err, CacheError::Storage(_)));

    // Candidate selection fails, so no recovery action is logged
    assert_eq!(cache.health().await.state, CacheState::Critical);
    assert!(cache.trigger_self_healing().await.is_none());
    assert!(cache.recovery().history().is_empty());
}

#[tokio::test]
async fn test_stats_serialize_to_json() {
    let cache = cache_with(fast_config());
    cache.set("a", "1".to_string(), None).await.unwrap();
    cache.get("a").await.unwrap();
    cache.get("b").await.unwrap();

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.storage_provider, "memory");
    assert_eq!((stats.hits, stats.misses), (1, 1));
    assert_eq!(stats.hit_rate, 0.5);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["health"]["state"], "HEALTHY");
    assert_eq!(json["recovery"]["total_actions"], 0);
    assert!(json["model"]["weights"].is_array());
}

#[tokio::test]
async fn test_health_is_a_pure_read() {
    let cache = cache_with(fast_config());
    cache.get("missing").await.unwrap();

    let first = cache.health().await;
    let second = cache.health().await;
    assert_eq!(first.state, second.state);
    assert_eq!(cache.monitor().history_len(), 0);
}
