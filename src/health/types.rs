//! Health snapshot and state types

use crate::constants::health;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-in-time health snapshot, immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub timestamp: DateTime<Utc>,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub error_rate: f64,
    pub avg_response_time_ms: f64,
    pub memory_usage_mb: f64,
    /// Error events retained in the monitor's bounded buffer
    pub failure_count: usize,
    /// Hits plus misses the rates were computed from
    pub total_requests: u64,
}

impl HealthMetrics {
    /// Snapshot of a cache that has not served anything yet
    pub fn idle() -> Self {
        Self {
            timestamp: Utc::now(),
            hit_rate: 0.0,
            miss_rate: 0.0,
            error_rate: 0.0,
            avg_response_time_ms: 0.0,
            memory_usage_mb: 0.0,
            failure_count: 0,
            total_requests: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.total_requests == 0 && self.failure_count == 0
    }

    /// Value of a single metric, as used for trend computation
    pub fn value_of(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::HitRate => self.hit_rate,
            MetricKind::MissRate => self.miss_rate,
            MetricKind::ErrorRate => self.error_rate,
            MetricKind::AvgResponseTime => self.avg_response_time_ms,
            MetricKind::MemoryUsage => self.memory_usage_mb,
            MetricKind::FailureCount => self.failure_count as f64,
        }
    }
}

/// Metric selector for [`super::HealthMonitor::trend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    HitRate,
    MissRate,
    ErrorRate,
    AvgResponseTime,
    MemoryUsage,
    FailureCount,
}

/// Overall cache state, derived from the latest snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheState {
    Healthy,
    Recovering,
    Degraded,
    Critical,
}

impl CacheState {
    /// Classify a snapshot, first matching band wins:
    ///
    /// 1. `error_rate > 0.5` or `failure_count > 10` is `Critical`
    /// 2. `error_rate > 0.2` or `hit_rate < 0.5` is `Degraded`
    /// 3. `error_rate > 0.1` is `Recovering`
    /// 4. otherwise `Healthy`
    ///
    /// A cache with no traffic and no errors is `Healthy`, an intentional
    /// departure from band 2, which would read its zero hit rate as `Degraded`.
    pub fn classify(metrics: &HealthMetrics) -> Self {
        if metrics.error_rate > health::CRITICAL_ERROR_RATE
            || metrics.failure_count > health::CRITICAL_FAILURE_COUNT
        {
            return CacheState::Critical;
        }

        if metrics.is_idle() {
            return CacheState::Healthy;
        }

        if metrics.error_rate > health::DEGRADED_ERROR_RATE
            || metrics.hit_rate < health::DEGRADED_HIT_RATE
        {
            return CacheState::Degraded;
        }

        if metrics.error_rate > health::RECOVERING_ERROR_RATE {
            return CacheState::Recovering;
        }

        CacheState::Healthy
    }

    /// Ordering used to detect degradation, higher is worse
    pub fn severity(&self) -> u8 {
        match self {
            CacheState::Healthy => 0,
            CacheState::Recovering => 1,
            CacheState::Degraded => 2,
            CacheState::Critical => 3,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, CacheState::Healthy)
    }

    /// Degraded or critical, the label used for training examples
    pub fn is_failing(&self) -> bool {
        matches!(self, CacheState::Degraded | CacheState::Critical)
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheState::Healthy => "HEALTHY",
            CacheState::Recovering => "RECOVERING",
            CacheState::Degraded => "DEGRADED",
            CacheState::Critical => "CRITICAL",
        };
        write!(f, "{name}")
    }
}

/// Result of `SelfHealingCache::health()`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub state: CacheState,
    pub metrics: HealthMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(error_rate: f64, hit_rate: f64) -> HealthMetrics {
        HealthMetrics {
            error_rate,
            hit_rate,
            miss_rate: 1.0 - hit_rate,
            total_requests: 100,
            ..HealthMetrics::idle()
        }
    }

    #[test]
    fn test_classification_bands() {
        assert_eq!(
            CacheState::classify(&metrics(0.6, 0.9)),
            CacheState::Critical
        );
        assert_eq!(
            CacheState::classify(&metrics(0.25, 0.9)),
            CacheState::Degraded
        );
        assert_eq!(
            CacheState::classify(&metrics(0.15, 0.9)),
            CacheState::Recovering
        );
        assert_eq!(
            CacheState::classify(&metrics(0.01, 0.99)),
            CacheState::Healthy
        );
    }

    #[test]
    fn test_classification_priority() {
        // Failure count alone is enough for critical
        let many_failures = HealthMetrics {
            failure_count: 11,
            ..metrics(0.0, 0.99)
        };
        assert_eq!(CacheState::classify(&many_failures), CacheState::Critical);

        // Low hit rate degrades even without errors
        assert_eq!(
            CacheState::classify(&metrics(0.0, 0.4)),
            CacheState::Degraded
        );

        // Boundaries are exclusive
        assert_eq!(
            CacheState::classify(&metrics(0.1, 0.5)),
            CacheState::Healthy
        );
    }

    #[test]
    fn test_idle_cache_is_healthy() {
        assert_eq!(
            CacheState::classify(&HealthMetrics::idle()),
            CacheState::Healthy
        );
    }

    #[test]
    fn test_severity_ordering_and_serialization() {
        assert!(CacheState::Critical.severity() > CacheState::Degraded.severity());
        assert!(CacheState::Degraded.severity() > CacheState::Recovering.severity());
        assert!(CacheState::Recovering.severity() > CacheState::Healthy.severity());
        assert!(CacheState::Degraded.is_failing());
        assert!(!CacheState::Recovering.is_failing());

        assert_eq!(
            serde_json::to_string(&CacheState::Degraded).unwrap(),
            "\"DEGRADED\""
        );
        assert_eq!(CacheState::Critical.to_string(), "CRITICAL");
    }
}
