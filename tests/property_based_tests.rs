use proptest::prelude::*;
use self_healing_cache::cache::pattern_matches;
use self_healing_cache::prediction::FeatureVector;
use self_healing_cache::{CacheState, FailurePredictor, HealthMetrics, HealthMonitor, MemoryStore};

#[derive(Debug, Clone)]
enum Request {
    Hit,
    Miss,
    Error,
}

fn request_strategy() -> impl Strategy<Value = Request> {
    prop_oneof![Just(Request::Hit), Just(Request::Miss), Just(Request::Error)]
}

fn metrics_strategy() -> impl Strategy<Value = HealthMetrics> {
    (0.0..=1.0f64, 0.0..=1.0f64, 0.0..5_000.0f64, 0.0..4_096.0f64, 0usize..200, 0u64..10_000).prop_map(
        |(hit_rate, error_rate, avg_response_time_ms, memory_usage_mb, failure_count, total_requests)| {
            HealthMetrics {
                hit_rate,
                miss_rate: 1.0 - hit_rate,
                error_rate,
                avg_response_time_ms,
                memory_usage_mb,
                failure_count,
                total_requests,
                ..HealthMetrics::idle()
            }
        },
    )
}

proptest! {
    /// Property: The store never holds more entries than its capacity
    #[test]
    fn store_size_never_exceeds_capacity(
        capacity in 1usize..20,
        keys in prop::collection::vec(0u8..50, 1..200),
    ) {
        let store = MemoryStore::new(capacity, None);
        for key in &keys {
            let key = format!("k{key}");
            store.set(&key, key.clone(), None);

            prop_assert!(store.size() <= capacity);
            // The entry just written is never the one evicted
            prop_assert_eq!(store.get(&key), Some(key.clone()));
        }
    }

    /// Property: Rates stay within [0, 1] for any request mix
    #[test]
    fn monitor_rates_are_bounded(requests in prop::collection::vec(request_strategy(), 0..300)) {
        let monitor = HealthMonitor::new();
        for request in &requests {
            match request {
                Request::Hit => monitor.record_hit(),
                Request::Miss => monitor.record_miss(),
                Request::Error => monitor.record_error(),
            }
        }

        let metrics = monitor.current_metrics();
        for rate in [metrics.hit_rate, metrics.miss_rate, metrics.error_rate] {
            prop_assert!((0.0..=1.0).contains(&rate));
        }
        if metrics.total_requests > 0 {
            prop_assert!((metrics.hit_rate + metrics.miss_rate - 1.0).abs() < 1e-9);
        }
    }

    /// Property: High error rates always classify as critical
    #[test]
    fn high_error_rate_is_critical(mut metrics in metrics_strategy(), error_rate in 0.51..=1.0f64) {
        metrics.error_rate = error_rate;
        prop_assert_eq!(CacheState::classify(&metrics), CacheState::Critical);
    }

    /// Property: Features and probabilities are normalised for any input
    #[test]
    fn prediction_outputs_are_bounded(
        metrics in metrics_strategy(),
        error_trend in -10.0..10.0f64,
        hit_trend in -10.0..10.0f64,
        response_trend in -1_000.0..1_000.0f64,
        failure_frequency in 0usize..500,
    ) {
        let features = FeatureVector::from_signals(
            &metrics, error_trend, hit_trend, response_trend, failure_frequency,
        );
        prop_assert!(features.as_array().iter().all(|value| (0.0..=1.0).contains(value)));

        let predictor = FailurePredictor::new();
        let prediction = predictor.predict(
            &metrics, error_trend, hit_trend, response_trend, failure_frequency,
        );
        prop_assert!((0.0..=1.0).contains(&prediction.probability));
        prop_assert!((0.0..=1.0).contains(&prediction.confidence));
    }

    /// Property: Confidence never decreases as examples accumulate
    #[test]
    fn confidence_is_monotonic(labels in prop::collection::vec(any::<bool>(), 1..150)) {
        let predictor = FailurePredictor::new();
        let features = FeatureVector::from_signals(&HealthMetrics::idle(), 0.01, -0.01, 5.0, 3);

        let mut previous = predictor.confidence();
        for label in labels {
            predictor.learn(features, label);
            let current = predictor.confidence();
            prop_assert!(current >= previous);
            prop_assert!(current <= 1.0);
            previous = current;
        }

        let weights = predictor.model_stats().weights;
        prop_assert!(weights.iter().all(|weight| weight.is_finite()));
    }

    /// Property: Wildcards match any key with the literal prefix
    #[test]
    fn prefix_patterns_match(prefix in "[a-z]{1,8}", suffix in "[a-z0-9:]{0,12}") {
        let key = format!("{prefix}{suffix}");
        prop_assert!(pattern_matches("*", &key));
        prop_assert!(pattern_matches(&key, &key));
        let pattern = format!("{prefix}*");
        prop_assert!(pattern_matches(&pattern, &key));
    }
}
