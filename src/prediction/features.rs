//! Feature extraction for the failure predictor

use crate::constants::prediction::{
    CURRENT_ERROR_RATE_MAX, ERROR_TREND_BOUND, FAILURE_FREQUENCY_MAX, FEATURE_COUNT,
    HIT_RATE_TREND_BOUND, MEMORY_PRESSURE_MB, RESPONSE_TREND_BOUND_MS,
};
use crate::health::HealthMetrics;
use serde::{Deserialize, Serialize};

/// Six health-derived signals, each normalised into [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub error_rate_trend: f64,
    /// High when the hit rate is falling
    pub hit_rate_trend: f64,
    pub response_time_trend: f64,
    pub failure_frequency: f64,
    pub current_error_rate: f64,
    pub memory_pressure: f64,
}

impl FeatureVector {
    /// Normalise raw signals against fixed per-feature bounds
    ///
    /// Trends are per snapshot; a trend of `-bound` maps to 0, no change to
    /// 0.5 and `+bound` to 1. The hit-rate trend is inverted.
    pub fn from_signals(
        metrics: &HealthMetrics,
        error_trend: f64,
        hit_trend: f64,
        response_trend: f64,
        failure_frequency: usize,
    ) -> Self {
        Self {
            error_rate_trend: symmetric(error_trend, ERROR_TREND_BOUND),
            hit_rate_trend: symmetric(-hit_trend, HIT_RATE_TREND_BOUND),
            response_time_trend: symmetric(response_trend, RESPONSE_TREND_BOUND_MS),
            failure_frequency: unit(failure_frequency as f64 / FAILURE_FREQUENCY_MAX),
            current_error_rate: unit(metrics.error_rate / CURRENT_ERROR_RATE_MAX),
            memory_pressure: unit(metrics.memory_usage_mb / MEMORY_PRESSURE_MB),
        }
    }

    /// Feature values in model weight order
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.error_rate_trend,
            self.hit_rate_trend,
            self.response_time_trend,
            self.failure_frequency,
            self.current_error_rate,
            self.memory_pressure,
        ]
    }
}

fn symmetric(value: f64, bound: f64) -> f64 {
    unit((value + bound) / (2.0 * bound))
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(error_rate: f64, memory_usage_mb: f64) -> HealthMetrics {
        HealthMetrics {
            error_rate,
            memory_usage_mb,
            total_requests: 100,
            ..HealthMetrics::idle()
        }
    }

    #[test]
    fn test_neutral_trends_map_to_midpoint() {
        let features = FeatureVector::from_signals(&metrics(0.0, 0.0), 0.0, 0.0, 0.0, 0);
        assert_eq!(features.error_rate_trend, 0.5);
        assert_eq!(features.hit_rate_trend, 0.5);
        assert_eq!(features.response_time_trend, 0.5);
        assert_eq!(features.failure_frequency, 0.0);
        assert_eq!(features.current_error_rate, 0.0);
    }

    #[test]
    fn test_falling_hit_rate_is_a_high_signal() {
        let falling = FeatureVector::from_signals(&metrics(0.0, 0.0), 0.0, -0.05, 0.0, 0);
        let rising = FeatureVector::from_signals(&metrics(0.0, 0.0), 0.0, 0.05, 0.0, 0);
        assert!(falling.hit_rate_trend > 0.5);
        assert!(rising.hit_rate_trend < 0.5);
    }

    #[test]
    fn test_features_are_clamped() {
        let features =
            FeatureVector::from_signals(&metrics(0.9, 4096.0), 5.0, -5.0, 10_000.0, 500);
        assert!(features.as_array().iter().all(|v| *v == 1.0));

        let features =
            FeatureVector::from_signals(&metrics(0.0, 0.0), -5.0, 5.0, -10_000.0, 0);
        assert!(features.as_array().iter().all(|v| *v == 0.0));

        let features = FeatureVector::from_signals(&metrics(f64::NAN, 0.0), f64::NAN, 0.0, 0.0, 0);
        assert_eq!(features.current_error_rate, 0.0);
        assert_eq!(features.error_rate_trend, 0.0);
    }
}
