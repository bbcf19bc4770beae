//! Orchestrator callback and reporting types

use crate::error::BoxError;
use crate::health::HealthReport;
use crate::prediction::{AccuracyReport, ModelStats};
use crate::resilience::RecoveryStats;
use futures::future::BoxFuture;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// User-supplied loader that re-fetches a value for a key
///
/// `Ok(None)` means the key does not exist upstream and is treated as a miss;
/// `Err` is an upstream failure and is retried.
pub type RefreshFn<V> =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<Option<V>, BoxError>> + Send + Sync>;

/// Box an async closure into a [`RefreshFn`]
pub fn into_refresh_fn<V, F, Fut>(refresh: F) -> RefreshFn<V>
where
    V: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<V>, BoxError>> + Send + 'static,
{
    Arc::new(
        move |key: String| -> BoxFuture<'static, Result<Option<V>, BoxError>> {
            Box::pin(refresh(key))
        },
    )
}

/// Result of `SelfHealingCache::stats()`
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub storage_provider: &'static str,
    pub health: HealthReport,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub hit_rate: f64,
    pub model: ModelStats,
    pub accuracy: AccuracyReport,
    pub recovery: RecoveryStats,
}
