//! # Self-Healing Cache
//!
//! The public surface of the engine. Serves get/set/delete against the
//! storage adapter, retries upstream refreshes with backoff, samples the
//! failure predictor every Nth request and runs the periodic health check
//! that hands degraded states to the recovery manager.
//!
//! ## Lock order
//!
//! Components own their own locks and are never locked while another
//! component's lock is held, in the order Store → Monitor → Predictor →
//! Recovery. No synchronous lock is held across an `.await`.

use super::backoff::BackoffCalculator;
use super::builder::SelfHealingCacheBuilder;
use super::health_check::HealthCheckTask;
use super::types::{into_refresh_fn, CacheStats, RefreshFn};
use crate::cache::{CacheEntry, MemoryStore, StorageAdapter};
use crate::config::CacheConfig;
use crate::constants::{orchestration, prediction::PENDING_PREDICTION_LIMIT};
use crate::error::{BoxError, CacheError, CacheResult};
use crate::health::{CacheState, HealthMetrics, HealthMonitor, HealthReport, MetricKind};
use crate::prediction::{FailurePrediction, FailurePredictor, PredictionId};
use crate::resilience::{KeyRefresher, RecoveryAction, RecoveryManager, RecoveryStrategy};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Prediction awaiting its ground-truth check
#[derive(Debug, Clone, Copy)]
struct PendingOutcome {
    id: PredictionId,
    due_at: Instant,
    state_before: CacheState,
    error_rate_before: f64,
}

/// Clears the in-progress flag when a self-healing pass ends
struct HealingGuard<'a>(&'a AtomicBool);

impl Drop for HealingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Refreshes keys through the user loader and writes them back to storage
struct StoreRefresher<'a, V, S> {
    storage: &'a S,
    refresh: RefreshFn<V>,
}

#[async_trait]
impl<V, S> KeyRefresher for StoreRefresher<'_, V, S>
where
    V: Clone + Send + Sync + 'static,
    S: StorageAdapter<V>,
{
    async fn refresh(&self, key: &str) -> Result<(), BoxError> {
        match (self.refresh)(key.to_string()).await? {
            Some(value) => self.storage.set(key, value, None).await?,
            // Gone upstream, drop the stale copy
            None => {
                self.storage.delete(key).await?;
            }
        }
        Ok(())
    }
}

fn estimate_memory_mb<V>(entries: usize) -> f64 {
    (entries * std::mem::size_of::<CacheEntry<V>>()) as f64 / (1024.0 * 1024.0)
}

/// State shared between the cache handle and its health check task
pub(crate) struct CacheCore<V, S> {
    config: CacheConfig,
    default_strategy: RecoveryStrategy,
    storage: S,
    monitor: HealthMonitor,
    predictor: FailurePredictor,
    recovery: RecoveryManager,
    backoff: BackoffCalculator,
    refresh_fn: RwLock<Option<RefreshFn<V>>>,
    request_count: AtomicU64,
    pending_outcomes: Mutex<VecDeque<PendingOutcome>>,
    healing: AtomicBool,
}

impl<V, S> CacheCore<V, S>
where
    V: Clone + Send + Sync + 'static,
    S: StorageAdapter<V> + 'static,
{
    fn refresh_fn(&self) -> Option<RefreshFn<V>> {
        self.refresh_fn.read().clone()
    }

    async fn get(&self, key: &str) -> CacheResult<Option<V>> {
        let request_number = self.request_count.fetch_add(1, Ordering::Relaxed) + 1;
        let result = self.serve(key).await;

        if self.config.enable_ml && request_number % self.config.ml_sampling_interval == 0 {
            self.ml_sampling_step().await;
        }

        result
    }

    async fn serve(&self, key: &str) -> CacheResult<Option<V>> {
        let started = Instant::now();

        // Failing fast is the intended behaviour, so this is a miss not an Err
        if self.recovery.is_circuit_breaker_open() {
            self.monitor.record_error();
            debug!(key = key, "Circuit breaker open, short-circuiting to miss");
            return Ok(None);
        }

        let cached = match self.storage.get(key).await {
            Ok(cached) => cached,
            Err(e) => {
                self.monitor.record_error();
                return Err(e);
            }
        };

        if let Some(value) = cached {
            self.monitor.record_hit();
            self.monitor.record_response_time(started.elapsed());
            debug!(key = key, "Cache hit");
            return Ok(Some(value));
        }

        self.monitor.record_miss();
        debug!(key = key, "Cache miss");

        let result = match self.refresh_fn() {
            Some(refresh) => self.refresh_with_retry(key, refresh).await,
            None => Ok(None),
        };
        self.monitor.record_response_time(started.elapsed());
        result
    }

    async fn refresh_with_retry(&self, key: &str, refresh: RefreshFn<V>) -> CacheResult<Option<V>> {
        let max_attempts = self.config.max_refresh_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match refresh(key.to_string()).await {
                Ok(Some(value)) => {
                    if let Err(e) = self.storage.set(key, value.clone(), None).await {
                        self.monitor.record_error();
                        return Err(e);
                    }
                    debug!(key = key, attempt = attempt, "Refreshed value from upstream");
                    return Ok(Some(value));
                }
                Ok(None) => {
                    debug!(key = key, "Key absent upstream");
                    return Ok(None);
                }
                Err(source) if attempt >= max_attempts => {
                    self.monitor.record_error();
                    warn!(
                        key = key,
                        attempts = attempt,
                        error = %source,
                        "Upstream refresh failed, retries exhausted"
                    );
                    return Err(CacheError::UpstreamFailure {
                        key: key.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(source) => {
                    let delay = self.backoff.delay_for_attempt(attempt);
                    debug!(
                        key = key,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %source,
                        "Upstream refresh failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn update_memory_gauge(&self) {
        match self.storage.size().await {
            Ok(size) => self
                .monitor
                .set_memory_usage_mb(estimate_memory_mb::<V>(size)),
            Err(e) => debug!(error = %e, "Storage size unavailable for memory gauge"),
        }
    }

    /// Snapshot appended to the trend history
    async fn record_metrics(&self) -> HealthMetrics {
        self.update_memory_gauge().await;
        self.monitor.current_metrics()
    }

    async fn health(&self) -> HealthReport {
        self.update_memory_gauge().await;
        let metrics = self.monitor.snapshot();
        HealthReport {
            state: CacheState::classify(&metrics),
            metrics,
        }
    }

    /// Predict and queue the prediction for outcome resolution
    fn predict(&self, metrics: &HealthMetrics, error_trend: f64) -> FailurePrediction {
        let prediction = self.predictor.predict(
            metrics,
            error_trend,
            self.monitor.trend(MetricKind::HitRate),
            self.monitor.trend(MetricKind::AvgResponseTime),
            self.monitor.failure_frequency(),
        );

        let mut pending = self.pending_outcomes.lock();
        pending.push_back(PendingOutcome {
            id: prediction.id,
            due_at: Instant::now() + self.config.outcome_resolution_delay(),
            state_before: CacheState::classify(metrics),
            error_rate_before: metrics.error_rate,
        });
        while pending.len() > PENDING_PREDICTION_LIMIT {
            pending.pop_front();
        }

        prediction
    }

    /// Check due predictions against what actually happened
    fn resolve_due_outcomes(&self) -> usize {
        let now = Instant::now();
        let due: Vec<PendingOutcome> = {
            let mut pending = self.pending_outcomes.lock();
            let mut due = Vec::new();
            while pending.front().is_some_and(|outcome| outcome.due_at <= now) {
                if let Some(outcome) = pending.pop_front() {
                    due.push(outcome);
                }
            }
            due
        };

        if due.is_empty() {
            return 0;
        }

        let current = self.monitor.snapshot();
        let state = CacheState::classify(&current);
        for outcome in &due {
            let actual_failure = state.severity() > outcome.state_before.severity()
                || state == CacheState::Critical
                || current.error_rate - outcome.error_rate_before
                    > orchestration::OUTCOME_ERROR_RATE_DELTA;
            self.predictor.record_outcome(outcome.id, actual_failure);
        }

        debug!(resolved = due.len(), state = %state, "Resolved prediction outcomes");
        due.len()
    }

    async fn ml_sampling_step(&self) {
        self.resolve_due_outcomes();

        let metrics = self.record_metrics().await;
        let state = CacheState::classify(&metrics);
        let error_trend = self.monitor.trend(MetricKind::ErrorRate);
        let prediction = self.predict(&metrics, error_trend);

        // Steady healthy samples would teach the model that nothing ever fails
        let has_signal = state.is_failing()
            || error_trend > 0.0
            || metrics.error_rate > orchestration::TRAINING_ERROR_RATE_FLOOR;
        if has_signal {
            self.predictor.learn(prediction.features, state.is_failing());
        }

        debug!(
            prediction_id = %prediction.id,
            probability = prediction.probability,
            state = %state,
            trained = has_signal,
            "ML sampling step"
        );
    }

    fn select_strategy(&self, prediction: &FailurePrediction) -> RecoveryStrategy {
        let threshold = self.config.prediction_threshold;
        if self.config.enable_ml
            && prediction.confidence >= threshold
            && prediction.probability >= threshold
        {
            prediction.recommended_strategy
        } else {
            self.default_strategy
        }
    }

    pub(crate) async fn run_health_check(&self) {
        let metrics = self.record_metrics().await;
        let state = CacheState::classify(&metrics);

        match self.storage.sweep_expired().await {
            Ok(0) => {}
            Ok(swept) => debug!(swept = swept, "Swept expired entries"),
            Err(e) => warn!(error = %e, "Expired entry sweep failed"),
        }
        self.resolve_due_outcomes();

        if state.is_healthy() {
            debug!(
                hit_rate = metrics.hit_rate,
                error_rate = metrics.error_rate,
                "Health check passed"
            );
            return;
        }

        warn!(
            state = %state,
            hit_rate = metrics.hit_rate,
            error_rate = metrics.error_rate,
            failure_count = metrics.failure_count,
            "⚠️ Cache health degraded"
        );

        if self.config.enable_adaptive_recovery {
            self.trigger_self_healing().await;
        }
    }

    async fn trigger_self_healing(&self) -> Option<RecoveryAction> {
        let metrics = self.record_metrics().await;
        let state = CacheState::classify(&metrics);
        if state.is_healthy() {
            debug!("Cache healthy, self-healing skipped");
            return None;
        }

        if self.healing.swap(true, Ordering::AcqRel) {
            debug!("Self-healing already in progress");
            return None;
        }
        let _guard = HealingGuard(&self.healing);

        let error_trend = self.monitor.trend(MetricKind::ErrorRate);
        let prediction = self.predict(&metrics, error_trend);
        let strategy = self.select_strategy(&prediction);

        let Some(refresh) = self.refresh_fn() else {
            debug!("No refresh function configured, self-healing skipped");
            return None;
        };

        let keys = match self
            .storage
            .ranked_keys(orchestration::MAX_RECOVERY_CANDIDATES)
            .await
        {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Failed to select recovery candidates");
                return None;
            }
        };
        if keys.is_empty() {
            debug!("No recovery candidates, self-healing skipped");
            return None;
        }

        info!(
            state = %state,
            strategy = %strategy,
            probability = prediction.probability,
            confidence = prediction.confidence,
            candidates = keys.len(),
            "🩺 Triggering self-healing"
        );

        let refresher = StoreRefresher {
            storage: &self.storage,
            refresh,
        };
        let result = self
            .recovery
            .execute_recovery(strategy, &keys, &refresher, &metrics)
            .await;

        let metrics_after = self.record_metrics().await;
        let still_failing = CacheState::classify(&metrics_after).is_failing();

        let action_id = match result {
            Ok(action) => action.id,
            Err(CacheError::RecoveryFailed {
                action_id,
                strategy,
                reason,
            }) => {
                error!(
                    action_id = %action_id,
                    strategy = %strategy,
                    reason = %reason,
                    "❌ Self-healing failed"
                );
                action_id
            }
            Err(e) => {
                error!(error = %e, "❌ Self-healing failed");
                return None;
            }
        };

        self.recovery
            .backfill_metrics_after(action_id, metrics_after);
        if self.config.enable_ml {
            self.predictor.learn(prediction.features, still_failing);
        }

        self.recovery.action(action_id)
    }
}

/// Self-healing, adaptive key-value cache
///
/// Generic over the value type and the storage adapter; the built-in
/// [`MemoryStore`] is the default backend.
pub struct SelfHealingCache<V, S = MemoryStore<V>> {
    core: Arc<CacheCore<V, S>>,
    health_task: Mutex<Option<HealthCheckTask>>,
}

impl<V> SelfHealingCache<V, MemoryStore<V>>
where
    V: Clone + Send + Sync + 'static,
{
    /// Cache backed by the in-memory store
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        SelfHealingCacheBuilder::from_config(config).build()
    }

    pub fn builder() -> SelfHealingCacheBuilder<V> {
        SelfHealingCacheBuilder::new()
    }
}

impl<V, S> SelfHealingCache<V, S>
where
    V: Clone + Send + Sync + 'static,
    S: StorageAdapter<V> + 'static,
{
    /// Cache backed by a custom storage adapter
    pub fn with_storage(config: CacheConfig, storage: S) -> CacheResult<Self> {
        Self::assemble(config, storage, None)
    }

    pub(crate) fn assemble(
        config: CacheConfig,
        storage: S,
        refresh_fn: Option<RefreshFn<V>>,
    ) -> CacheResult<Self> {
        config.validate()?;
        let default_strategy: RecoveryStrategy = config.default_strategy.parse()?;

        info!(
            max_entries = config.max_entries,
            health_check_interval_ms = config.health_check_interval_ms,
            enable_ml = config.enable_ml,
            enable_adaptive_recovery = config.enable_adaptive_recovery,
            default_strategy = %default_strategy,
            storage = storage.provider_name(),
            "Self-healing cache created"
        );

        let core = CacheCore {
            default_strategy,
            storage,
            monitor: HealthMonitor::new(),
            predictor: FailurePredictor::new(),
            recovery: RecoveryManager::new(config.recovery.clone(), config.circuit_breaker.clone()),
            backoff: BackoffCalculator::new(config.backoff.clone()),
            refresh_fn: RwLock::new(refresh_fn),
            request_count: AtomicU64::new(0),
            pending_outcomes: Mutex::new(VecDeque::new()),
            healing: AtomicBool::new(false),
            config,
        };

        Ok(Self {
            core: Arc::new(core),
            health_task: Mutex::new(None),
        })
    }

    /// Get a value, refreshing it from upstream on a miss
    ///
    /// Returns `Ok(None)` on a miss without a refresh function, when the key
    /// is absent upstream, or while the circuit breaker is open. Returns
    /// [`CacheError::UpstreamFailure`] once every refresh attempt failed.
    pub async fn get(&self, key: &str) -> CacheResult<Option<V>> {
        self.core.get(key).await
    }

    /// Store a value; `None` TTL uses the configured default
    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> CacheResult<()> {
        self.core.storage.set(key, value, ttl).await?;
        debug!(key = key, "Cache set");
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let existed = self.core.storage.delete(key).await?;
        debug!(key = key, existed = existed, "Cache delete");
        Ok(existed)
    }

    pub async fn clear(&self) -> CacheResult<()> {
        self.core.storage.clear().await?;
        info!("Cache cleared");
        Ok(())
    }

    /// Install or replace the upstream loader used on misses and recovery
    pub fn set_refresh_function<F, Fut>(&self, refresh: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<V>, BoxError>> + Send + 'static,
    {
        *self.core.refresh_fn.write() = Some(into_refresh_fn(refresh));
    }

    /// Run one self-healing pass now
    ///
    /// No-op while healthy. Recovery failures are logged and recorded in the
    /// recovery history, never returned; the action is returned when one ran.
    pub async fn trigger_self_healing(&self) -> Option<RecoveryAction> {
        self.core.trigger_self_healing().await
    }

    /// Run one health-check tick now, as the background task would
    pub async fn run_health_check(&self) {
        self.core.run_health_check().await;
    }

    pub async fn health(&self) -> HealthReport {
        self.core.health().await
    }

    pub async fn stats(&self) -> CacheResult<CacheStats> {
        let size = self.core.storage.size().await?;
        let health = self.core.health().await;
        let counters = self.core.monitor.counters();

        Ok(CacheStats {
            size,
            storage_provider: self.core.storage.provider_name(),
            health,
            hits: counters.hits,
            misses: counters.misses,
            errors: counters.errors,
            hit_rate: counters.hit_rate(),
            model: self.core.predictor.model_stats(),
            accuracy: self.core.predictor.accuracy_report(),
            recovery: self
                .core
                .recovery
                .stats(orchestration::RECENT_HISTORY_IN_STATS),
        })
    }

    /// Start the periodic health check; no-op if already running
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut task = self.health_task.lock();
        if task.is_some() {
            debug!("Health check already running");
            return;
        }

        *task = Some(HealthCheckTask::spawn(
            Arc::downgrade(&self.core),
            self.core.config.health_check_interval(),
        ));
    }

    /// Stop the health check and wait for it to finish; no-op if not running
    pub async fn stop(&self) {
        let task = self.health_task.lock().take();
        if let Some(task) = task {
            task.shutdown().await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.health_task.lock().is_some()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.core.config
    }

    pub fn storage(&self) -> &S {
        &self.core.storage
    }

    pub fn monitor(&self) -> &HealthMonitor {
        &self.core.monitor
    }

    pub fn predictor(&self) -> &FailurePredictor {
        &self.core.predictor
    }

    pub fn recovery(&self) -> &RecoveryManager {
        &self.core.recovery
    }

    pub fn is_circuit_breaker_open(&self) -> bool {
        self.core.recovery.is_circuit_breaker_open()
    }
}

impl<V, S> Drop for SelfHealingCache<V, S> {
    fn drop(&mut self) {
        // Dropping the task's shutdown sender ends its loop
        if self.health_task.get_mut().take().is_some() {
            debug!("Cache dropped with health check running, task signalled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn config() -> CacheConfig {
        CacheConfig {
            max_entries: 100,
            backoff: crate::config::BackoffConfig {
                base_delay_ms: 1,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_set_then_get_is_a_hit() {
        let cache: SelfHealingCache<String> = SelfHealingCache::new(config()).unwrap();
        cache.set("k", "v".to_string(), None).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));

        let counters = cache.monitor().counters();
        assert_eq!(counters.hits, 1);
        assert_eq!(counters.misses, 0);
    }

    #[tokio::test]
    async fn test_miss_without_refresh_function() {
        let cache: SelfHealingCache<u32> = SelfHealingCache::new(config()).unwrap();
        assert_eq!(cache.get("missing").await.unwrap(), None);
        assert_eq!(cache.monitor().counters().misses, 1);
        assert_eq!(cache.monitor().counters().errors, 0);
    }

    #[tokio::test]
    async fn test_refresh_populates_store() {
        let cache: SelfHealingCache<String> = SelfHealingCache::new(config()).unwrap();
        cache.set_refresh_function(|key| async move { Ok(Some(format!("loaded:{key}"))) });

        assert_eq!(
            cache.get("a").await.unwrap(),
            Some("loaded:a".to_string())
        );
        // Second read is served from the store
        assert_eq!(
            cache.get("a").await.unwrap(),
            Some("loaded:a".to_string())
        );
        let counters = cache.monitor().counters();
        assert_eq!((counters.hits, counters.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_absent_upstream_is_not_retried() {
        let cache: SelfHealingCache<u32> = SelfHealingCache::new(config()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        cache.set_refresh_function(move |_key| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        });

        assert_eq!(cache.get("ghost").await.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.monitor().counters().errors, 0);
    }

    #[tokio::test]
    async fn test_exhausted_refresh_records_one_error() {
        let cache: SelfHealingCache<u32> = SelfHealingCache::new(config()).unwrap();
        cache.set_refresh_function(|_key| async { Err::<Option<u32>, BoxError>("down".into()) });

        let err = cache.get("k").await.unwrap_err();
        assert!(matches!(err, CacheError::UpstreamFailure { attempts: 2, .. }));
        assert_eq!(cache.monitor().counters().errors, 1);
    }

    #[tokio::test]
    async fn test_unknown_default_strategy_is_rejected() {
        let result: CacheResult<SelfHealingCache<u32>> = SelfHealingCache::new(CacheConfig {
            default_strategy: "PRAY".to_string(),
            ..config()
        });
        assert!(matches!(result, Err(CacheError::UnknownStrategy(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let result: CacheResult<SelfHealingCache<u32>> = SelfHealingCache::new(CacheConfig {
            max_entries: 0,
            ..config()
        });
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_self_healing_is_noop_when_healthy() {
        let cache: SelfHealingCache<u32> = SelfHealingCache::new(config()).unwrap();
        cache.set_refresh_function(|_key| async { Ok(Some(1)) });
        cache.set("k", 1, None).await.unwrap();
        cache.get("k").await.unwrap();

        assert!(cache.trigger_self_healing().await.is_none());
        assert!(cache.recovery().history().is_empty());
    }

    #[tokio::test]
    async fn test_ml_sampling_registers_and_resolves_predictions() {
        let cache: SelfHealingCache<u32> = SelfHealingCache::new(CacheConfig {
            ml_sampling_interval: 1,
            outcome_resolution_delay_ms: 0,
            ..config()
        })
        .unwrap();
        cache.set("k", 1, None).await.unwrap();

        cache.get("k").await.unwrap();
        assert_eq!(cache.predictor().pending_predictions(), 1);

        // The next sampling step resolves the previous prediction first
        cache.get("k").await.unwrap();
        assert_eq!(cache.predictor().accuracy_report().total_predictions, 1);
    }

    fn sampling_config() -> CacheConfig {
        CacheConfig {
            ml_sampling_interval: 1,
            outcome_resolution_delay_ms: 0,
            ..config()
        }
    }

    #[tokio::test]
    async fn test_steady_sampling_does_not_train() {
        let cache: SelfHealingCache<u32> = SelfHealingCache::new(sampling_config()).unwrap();
        cache.set("k", 1, None).await.unwrap();

        for _ in 0..20 {
            cache.get("k").await.unwrap();
        }

        let stats = cache.predictor().model_stats();
        assert_eq!(stats.examples_seen, 0);
        assert_eq!(stats.data_points, 0);
        // Predictions are still made and resolved
        assert_eq!(cache.predictor().accuracy_report().total_predictions, 19);
    }

    #[tokio::test]
    async fn test_failing_sample_trains_model() {
        let cache: SelfHealingCache<u32> = SelfHealingCache::new(sampling_config()).unwrap();
        cache.set_refresh_function(|_key| async { Err::<Option<u32>, BoxError>("down".into()) });

        cache.get("k").await.unwrap_err();

        assert_eq!(cache.monitor().state(), CacheState::Critical);
        assert_eq!(cache.predictor().model_stats().examples_seen, 1);
    }

    #[tokio::test]
    async fn test_degradation_after_prediction_resolves_as_failure() {
        let cache: SelfHealingCache<u32> = SelfHealingCache::new(sampling_config()).unwrap();
        cache.set("k", 1, None).await.unwrap();

        // Predicted while healthy
        cache.get("k").await.unwrap();
        assert_eq!(cache.predictor().pending_predictions(), 1);

        // The failed read degrades the cache before the next step resolves it
        cache.set_refresh_function(|_key| async { Err::<Option<u32>, BoxError>("down".into()) });
        cache.get("missing").await.unwrap_err();

        let report = cache.predictor().accuracy_report();
        assert_eq!(report.total_predictions, 1);
        assert_eq!(report.true_positives + report.false_negatives, 1);
        assert_eq!(report.true_negatives + report.false_positives, 0);
    }

    #[tokio::test]
    async fn test_ml_disabled_skips_sampling() {
        let cache: SelfHealingCache<u32> = SelfHealingCache::new(CacheConfig {
            ml_sampling_interval: 1,
            enable_ml: false,
            ..config()
        })
        .unwrap();

        cache.get("k").await.unwrap();
        assert_eq!(cache.predictor().pending_predictions(), 0);
    }

    #[tokio::test]
    async fn test_memory_gauge_tracks_store_size() {
        let cache: SelfHealingCache<u64> = SelfHealingCache::new(config()).unwrap();
        for i in 0..50 {
            cache.set(&format!("k{i}"), i, None).await.unwrap();
        }

        let report = cache.health().await;
        assert!(report.metrics.memory_usage_mb > 0.0);
        assert_eq!(report.metrics.memory_usage_mb, estimate_memory_mb::<u64>(50));
    }
}
