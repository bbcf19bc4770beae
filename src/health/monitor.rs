//! # Health Monitor
//!
//! Aggregates hit/miss/error counters and response-time samples into
//! [`HealthMetrics`] snapshots. Counters are cumulative since the last
//! `reset`; sample buffers and the snapshot history are bounded.

use super::types::{CacheState, HealthMetrics, MetricKind};
use crate::constants::health;
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cumulative request counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestCounters {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
}

impl RequestCounters {
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit ratio, 0 before any request
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.total_requests())
    }
}

fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    counters: RequestCounters,
    response_times_ms: VecDeque<f64>,
    error_timestamps: VecDeque<Instant>,
    history: VecDeque<HealthMetrics>,
    memory_usage_mb: f64,
}

impl MonitorState {
    fn snapshot(&self) -> HealthMetrics {
        let counters = self.counters;
        let total = counters.total_requests();

        let avg_response_time_ms = if self.response_times_ms.is_empty() {
            0.0
        } else {
            self.response_times_ms.iter().sum::<f64>() / self.response_times_ms.len() as f64
        };

        // Errors raised outside a hit/miss (open circuit) still count against
        // the rate, capped at 1
        let error_rate = if total == 0 {
            if counters.errors > 0 {
                1.0
            } else {
                0.0
            }
        } else {
            (counters.errors as f64 / total as f64).min(1.0)
        };

        HealthMetrics {
            timestamp: Utc::now(),
            hit_rate: ratio(counters.hits, total),
            miss_rate: ratio(counters.misses, total),
            error_rate,
            avg_response_time_ms,
            memory_usage_mb: self.memory_usage_mb,
            failure_count: self.error_timestamps.len(),
            total_requests: total,
        }
    }
}

/// Thread-safe health metrics aggregator
#[derive(Debug, Default)]
pub struct HealthMonitor {
    state: Mutex<MonitorState>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.state.lock().counters.hits += 1;
    }

    pub fn record_miss(&self) {
        self.state.lock().counters.misses += 1;
    }

    /// Record an error event; its timestamp feeds `failure_count` and
    /// `failure_frequency`
    pub fn record_error(&self) {
        let mut state = self.state.lock();
        state.counters.errors += 1;
        state.error_timestamps.push_back(Instant::now());
        while state.error_timestamps.len() > health::ERROR_TIMESTAMP_BUFFER {
            state.error_timestamps.pop_front();
        }
    }

    pub fn record_response_time(&self, elapsed: Duration) {
        let mut state = self.state.lock();
        state
            .response_times_ms
            .push_back(elapsed.as_secs_f64() * 1000.0);
        while state.response_times_ms.len() > health::RESPONSE_TIME_BUFFER {
            state.response_times_ms.pop_front();
        }
    }

    /// Update the memory gauge reported in snapshots
    pub fn set_memory_usage_mb(&self, memory_usage_mb: f64) {
        self.state.lock().memory_usage_mb = memory_usage_mb;
    }

    /// Produce a snapshot and append it to the trend history
    ///
    /// This is a mutation: each call grows the history. Use
    /// [`Self::latest_metrics`] or [`Self::state`] for a pure read.
    pub fn current_metrics(&self) -> HealthMetrics {
        let mut state = self.state.lock();
        let metrics = state.snapshot();

        state.history.push_back(metrics.clone());
        while state.history.len() > health::METRICS_HISTORY_LIMIT {
            state.history.pop_front();
        }

        metrics
    }

    /// Most recent snapshot in the history, without producing a new one
    pub fn latest_metrics(&self) -> Option<HealthMetrics> {
        self.state.lock().history.back().cloned()
    }

    /// Snapshot of the live counters, without touching the history
    pub fn snapshot(&self) -> HealthMetrics {
        self.state.lock().snapshot()
    }

    /// State of the live counters, without touching the history
    pub fn state(&self) -> CacheState {
        CacheState::classify(&self.snapshot())
    }

    pub fn counters(&self) -> RequestCounters {
        self.state.lock().counters
    }

    /// Least-squares slope of `kind` over the last 20 snapshots
    ///
    /// Uses snapshot index as x, so the slope is per snapshot rather than per
    /// second. Returns 0 until 10 snapshots exist.
    pub fn trend(&self, kind: MetricKind) -> f64 {
        let state = self.state.lock();
        let len = state.history.len();
        if len < health::TREND_MIN_SAMPLES {
            return 0.0;
        }

        let window = len.min(health::TREND_WINDOW);
        let values: Vec<f64> = state
            .history
            .iter()
            .skip(len - window)
            .map(|metrics| metrics.value_of(kind))
            .collect();

        least_squares_slope(&values)
    }

    /// Errors recorded within the trailing 60 seconds
    pub fn failure_frequency(&self) -> usize {
        let state = self.state.lock();
        let now = Instant::now();
        state
            .error_timestamps
            .iter()
            .filter(|at| now.saturating_duration_since(**at) <= health::FAILURE_FREQUENCY_WINDOW)
            .count()
    }

    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Clear counters, samples and history
    pub fn reset(&self) {
        *self.state.lock() = MonitorState::default();
        debug!("Health monitor reset");
    }
}

fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }

    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let (numerator, denominator) =
        values
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (index, value)| {
                let dx = index as f64 - mean_x;
                (num + dx * (value - mean_y), den + dx * dx)
            });

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
