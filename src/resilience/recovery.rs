//! # Recovery Manager
//!
//! Executes recovery strategies against a candidate key set and keeps the
//! append-only action history used for strategy ranking.
//!
//! Refresh strategies are throttled on purpose: keys are refreshed in
//! fixed-size batches that are joined before an inter-batch pause, so a
//! struggling upstream never sees more than one batch in flight.

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerMetrics};
use super::config::{CircuitBreakerConfig, RecoveryConfig};
use super::types::{KeyRefresher, RecoveryAction, RecoveryStrategy};
use crate::constants::recovery;
use crate::error::{BoxError, CacheError, CacheResult};
use crate::health::HealthMetrics;
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use futures::future::{join_all, BoxFuture};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
struct KeyFailureRecord {
    count: u32,
    window_start: Instant,
}

#[derive(Debug, Default, Clone, Copy)]
struct RefreshOutcome {
    attempted: usize,
    refreshed: usize,
    failed: usize,
    skipped: usize,
}

impl RefreshOutcome {
    fn merge(&mut self, other: RefreshOutcome) {
        self.attempted += other.attempted;
        self.refreshed += other.refreshed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    /// A refresh pass fails only when every attempted key failed
    fn succeeded(&self) -> bool {
        self.attempted == 0 || self.refreshed > 0
    }
}

/// Batch shape for one refresh pass
#[derive(Debug, Clone, Copy)]
struct BatchPlan {
    max_keys: usize,
    batch_size: usize,
    pause: Duration,
}

/// Summary of recovery effectiveness for `stats()`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryStats {
    pub total_actions: usize,
    pub success_rate: f64,
    pub best_strategy: RecoveryStrategy,
    pub active_recoveries: usize,
    pub circuit_breaker: CircuitBreakerMetrics,
    pub recent_history: Vec<RecoveryAction>,
}

/// Executes recovery strategies and tracks their outcomes
#[derive(Debug)]
pub struct RecoveryManager {
    config: RecoveryConfig,
    breaker_config: CircuitBreakerConfig,
    circuit_breaker: CircuitBreaker,
    active: DashSet<String>,
    key_failures: DashMap<String, KeyFailureRecord>,
    history: Mutex<VecDeque<RecoveryAction>>,
}

impl RecoveryManager {
    pub fn new(config: RecoveryConfig, breaker_config: CircuitBreakerConfig) -> Self {
        Self {
            circuit_breaker: CircuitBreaker::new(&breaker_config),
            config,
            breaker_config,
            active: DashSet::new(),
            key_failures: DashMap::new(),
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// Run `strategy` against `keys`, most valuable keys first
    ///
    /// Always appends exactly one [`RecoveryAction`] to the history. A failed
    /// circuit-breaker pass is returned as [`CacheError::RecoveryFailed`]
    /// after its action has been recorded, with the breaker left open.
    pub async fn execute_recovery(
        &self,
        strategy: RecoveryStrategy,
        keys: &[String],
        refresher: &dyn KeyRefresher,
        metrics_before: &HealthMetrics,
    ) -> CacheResult<RecoveryAction> {
        let started = Instant::now();
        let resolved = match strategy {
            RecoveryStrategy::Adaptive => Self::select_adaptive(metrics_before),
            other => other,
        };

        info!(
            strategy = %strategy,
            resolved_strategy = %resolved,
            candidate_keys = keys.len(),
            "🔧 Executing recovery"
        );

        let result = match resolved {
            RecoveryStrategy::ImmediateRefresh => Ok(self
                .refresh_keys(keys, self.immediate_plan(), refresher)
                .await),
            RecoveryStrategy::GradualRefresh => {
                Ok(self.refresh_keys(keys, self.gradual_plan(), refresher).await)
            }
            RecoveryStrategy::CircuitBreaker => self.run_circuit_breaker(keys, refresher).await,
            // Adaptive never resolves to itself
            RecoveryStrategy::Fallback | RecoveryStrategy::Adaptive => Ok(self.fallback(keys)),
        };

        let (outcome, error) = match result {
            Ok(outcome) if outcome.succeeded() => (outcome, None),
            Ok(outcome) => {
                let reason = format!("all {} refreshed keys failed", outcome.attempted);
                (outcome, Some(reason))
            }
            Err((outcome, reason)) => (outcome, Some(reason)),
        };

        let action = RecoveryAction {
            id: Uuid::new_v4(),
            strategy,
            resolved_strategy: resolved,
            timestamp: Utc::now(),
            success: error.is_none(),
            duration_ms: started.elapsed().as_millis() as u64,
            keys_attempted: outcome.attempted,
            keys_refreshed: outcome.refreshed,
            keys_failed: outcome.failed,
            keys_skipped: outcome.skipped,
            metrics_before: metrics_before.clone(),
            metrics_after: None,
            error: error.clone(),
        };
        self.push_history(action.clone());

        if action.success {
            info!(
                action_id = %action.id,
                strategy = %resolved,
                refreshed = action.keys_refreshed,
                failed = action.keys_failed,
                skipped = action.keys_skipped,
                duration_ms = action.duration_ms,
                "✅ Recovery completed"
            );
        } else {
            warn!(
                action_id = %action.id,
                strategy = %resolved,
                failed = action.keys_failed,
                error = ?action.error,
                "❌ Recovery failed"
            );
        }

        // Refresh passes report partial failure through the action; only a
        // failed circuit-breaker pass is an error
        match (resolved, error) {
            (RecoveryStrategy::CircuitBreaker, Some(reason)) => Err(CacheError::RecoveryFailed {
                action_id: action.id,
                strategy: resolved,
                reason,
            }),
            _ => Ok(action),
        }
    }

    /// Strategy `Adaptive` dispatches to for a metrics snapshot
    pub fn select_adaptive(metrics: &HealthMetrics) -> RecoveryStrategy {
        if metrics.error_rate > recovery::ADAPTIVE_CIRCUIT_ERROR_RATE {
            RecoveryStrategy::CircuitBreaker
        } else if metrics.avg_response_time_ms > recovery::ADAPTIVE_GRADUAL_RESPONSE_MS {
            RecoveryStrategy::GradualRefresh
        } else if metrics.hit_rate < recovery::ADAPTIVE_IMMEDIATE_HIT_RATE {
            RecoveryStrategy::ImmediateRefresh
        } else {
            RecoveryStrategy::Fallback
        }
    }

    fn immediate_plan(&self) -> BatchPlan {
        BatchPlan {
            max_keys: self.config.immediate_max_keys,
            batch_size: self.config.immediate_batch_size,
            pause: Duration::from_millis(self.config.immediate_batch_pause_ms),
        }
    }

    fn gradual_plan(&self) -> BatchPlan {
        BatchPlan {
            max_keys: self.config.gradual_max_keys,
            batch_size: self.config.gradual_batch_size,
            pause: Duration::from_millis(self.config.gradual_batch_pause_ms),
        }
    }

    async fn refresh_keys(
        &self,
        keys: &[String],
        plan: BatchPlan,
        refresher: &dyn KeyRefresher,
    ) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::default();
        let mut selected: Vec<&String> = Vec::with_capacity(plan.max_keys.min(keys.len()));

        for key in keys {
            if selected.len() >= plan.max_keys {
                break;
            }
            if self.is_suppressed(key) || !self.active.insert(key.clone()) {
                outcome.skipped += 1;
                continue;
            }
            selected.push(key);
        }
        outcome.attempted = selected.len();

        for (index, batch) in selected.chunks(plan.batch_size.max(1)).enumerate() {
            if index > 0 && !plan.pause.is_zero() {
                sleep(plan.pause).await;
            }

            let refreshes: Vec<BoxFuture<'_, (&String, Result<(), BoxError>)>> = batch
                .iter()
                .map(|&key| {
                    Box::pin(async move { (key, refresher.refresh(key).await) }) as BoxFuture<'_, _>
                })
                .collect();
            let results = join_all(refreshes).await;

            for (key, result) in results {
                self.active.remove(key);
                match result {
                    Ok(()) => {
                        outcome.refreshed += 1;
                        self.key_failures.remove(key);
                    }
                    Err(e) => {
                        outcome.failed += 1;
                        self.record_key_failure(key);
                        debug!(key = %key, error = %e, "Key refresh failed during recovery");
                    }
                }
            }
        }

        outcome
    }

    async fn run_circuit_breaker(
        &self,
        keys: &[String],
        refresher: &dyn KeyRefresher,
    ) -> Result<RefreshOutcome, (RefreshOutcome, String)> {
        self.circuit_breaker.open();
        sleep(self.breaker_config.stabilization()).await;
        self.circuit_breaker.half_open();

        // Probe only keys that can actually be refreshed
        let mut probe = Vec::with_capacity(self.breaker_config.probe_keys.min(keys.len()));
        let mut remainder = Vec::with_capacity(keys.len());
        for key in keys {
            if probe.len() < self.breaker_config.probe_keys
                && !self.is_suppressed(key)
                && !self.active.contains(key)
            {
                probe.push(key.clone());
            } else {
                remainder.push(key.clone());
            }
        }

        if !keys.is_empty() && probe.is_empty() {
            self.circuit_breaker.open();
            let outcome = RefreshOutcome {
                skipped: keys.len(),
                ..RefreshOutcome::default()
            };
            let reason = format!("none of {} candidate keys could be probed", keys.len());
            return Err((outcome, reason));
        }

        let probe_plan = BatchPlan {
            max_keys: probe.len(),
            batch_size: probe.len().max(1),
            pause: Duration::ZERO,
        };
        let mut outcome = self.refresh_keys(&probe, probe_plan, refresher).await;
        if outcome.attempted == 0 || outcome.failed > 0 {
            self.circuit_breaker.open();
            let reason = format!(
                "{} of {} probe keys failed",
                outcome.failed, outcome.attempted
            );
            return Err((outcome, reason));
        }

        self.circuit_breaker.close();
        let rest = self
            .refresh_keys(&remainder, self.gradual_plan(), refresher)
            .await;
        outcome.merge(rest);

        if rest.attempted > 0 && rest.refreshed == 0 {
            self.circuit_breaker.open();
            let reason = format!("all {} keys after the probe failed", rest.attempted);
            return Err((outcome, reason));
        }
        Ok(outcome)
    }

    fn fallback(&self, keys: &[String]) -> RefreshOutcome {
        let cleared = keys.iter().filter(|key| self.active.remove(*key).is_some()).count();
        debug!(cleared = cleared, "Fallback cleared active recovery markers");
        RefreshOutcome::default()
    }

    fn is_suppressed(&self, key: &str) -> bool {
        let window = self.config.key_failure_window();
        let record = match self.key_failures.get(key) {
            Some(record) => *record,
            None => return false,
        };

        if record.window_start.elapsed() > window {
            self.key_failures.remove(key);
            return false;
        }

        record.count >= self.config.max_key_failures
    }

    fn record_key_failure(&self, key: &str) {
        let window = self.config.key_failure_window();
        self.key_failures
            .entry(key.to_string())
            .and_modify(|record| {
                if record.window_start.elapsed() > window {
                    *record = KeyFailureRecord {
                        count: 1,
                        window_start: Instant::now(),
                    };
                } else {
                    record.count += 1;
                }
            })
            .or_insert(KeyFailureRecord {
                count: 1,
                window_start: Instant::now(),
            });
    }

    fn push_history(&self, action: RecoveryAction) {
        let mut history = self.history.lock();
        history.push_back(action);
        while history.len() > self.config.history_limit {
            history.pop_front();
        }
    }

    /// Attach post-recovery metrics to a logged action
    pub fn backfill_metrics_after(&self, action_id: Uuid, metrics: HealthMetrics) -> bool {
        let mut history = self.history.lock();
        match history.iter_mut().rev().find(|action| action.id == action_id) {
            Some(action) => {
                action.metrics_after = Some(metrics);
                true
            }
            None => false,
        }
    }

    /// Logged action by ID, if still retained
    pub fn action(&self, action_id: Uuid) -> Option<RecoveryAction> {
        self.history
            .lock()
            .iter()
            .rev()
            .find(|action| action.id == action_id)
            .cloned()
    }

    pub fn is_circuit_breaker_open(&self) -> bool {
        self.circuit_breaker.is_open()
    }

    pub fn circuit_breaker_metrics(&self) -> CircuitBreakerMetrics {
        self.circuit_breaker.metrics()
    }

    pub fn history(&self) -> Vec<RecoveryAction> {
        self.history.lock().iter().cloned().collect()
    }

    /// The `limit` most recent actions, oldest first
    pub fn recent_history(&self, limit: usize) -> Vec<RecoveryAction> {
        let history = self.history.lock();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    /// Share of logged actions that succeeded, 0 when none are logged
    pub fn success_rate(&self) -> f64 {
        let history = self.history.lock();
        if history.is_empty() {
            return 0.0;
        }
        let successes = history.iter().filter(|action| action.success).count();
        successes as f64 / history.len() as f64
    }

    /// Strategy with the best logged success rate
    ///
    /// `Adaptive` until 10 actions are logged; ties go to the strategy seen
    /// first.
    pub fn best_strategy(&self) -> RecoveryStrategy {
        let history = self.history.lock();
        if history.len() < recovery::MIN_HISTORY_FOR_RANKING {
            return RecoveryStrategy::Adaptive;
        }

        // (strategy, successes, total) in first-seen order
        let mut tallies: Vec<(RecoveryStrategy, usize, usize)> = Vec::new();
        for action in history.iter() {
            match tallies.iter_mut().find(|(s, _, _)| *s == action.strategy) {
                Some(tally) => {
                    tally.1 += usize::from(action.success);
                    tally.2 += 1;
                }
                None => tallies.push((action.strategy, usize::from(action.success), 1)),
            }
        }

        let mut best = (RecoveryStrategy::Adaptive, -1.0_f64);
        for (strategy, successes, total) in tallies {
            let rate = successes as f64 / total as f64;
            if rate > best.1 {
                best = (strategy, rate);
            }
        }
        best.0
    }

    pub fn active_recoveries(&self) -> usize {
        self.active.len()
    }

    pub fn stats(&self, recent: usize) -> RecoveryStats {
        RecoveryStats {
            total_actions: self.history.lock().len(),
            success_rate: self.success_rate(),
            best_strategy: self.best_strategy(),
            active_recoveries: self.active_recoveries(),
            circuit_breaker: self.circuit_breaker_metrics(),
            recent_history: self.recent_history(recent),
        }
    }

    /// Clear history, per-key bookkeeping and breaker state
    pub fn reset(&self) {
        self.history.lock().clear();
        self.active.clear();
        self.key_failures.clear();
        self.circuit_breaker.reset();
    }
}
