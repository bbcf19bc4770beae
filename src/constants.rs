//! # System Constants
//!
//! Tuning constants that define the operational boundaries of the cache engine.
//! They are empirically tuned; the configurable ones only provide the defaults
//! for [`crate::config::CacheConfig`].

/// Crate-level identifiers and configuration defaults
pub mod system {
    pub const VERSION: &str = "0.1.0";

    /// Environment variable prefix for configuration overrides
    pub const ENV_PREFIX: &str = "SELF_HEALING_CACHE";

    pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
    pub const DEFAULT_TTL_MS: u64 = 300_000;
    pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u64 = 10_000;
    pub const DEFAULT_PREDICTION_THRESHOLD: f64 = 0.75;
}

/// Health monitor retention windows and state classification bands
pub mod health {
    use std::time::Duration;

    /// Response-time samples kept for the rolling average
    pub const RESPONSE_TIME_BUFFER: usize = 1000;
    /// Error timestamps kept for `failure_count`
    pub const ERROR_TIMESTAMP_BUFFER: usize = 100;
    /// Snapshots kept for trend computation
    pub const METRICS_HISTORY_LIMIT: usize = 1000;
    /// Window for `failure_frequency`
    pub const FAILURE_FREQUENCY_WINDOW: Duration = Duration::from_secs(60);

    /// Snapshots used by the least-squares trend
    pub const TREND_WINDOW: usize = 20;
    /// Minimum snapshots before a trend is reported
    pub const TREND_MIN_SAMPLES: usize = 10;

    pub const CRITICAL_ERROR_RATE: f64 = 0.5;
    pub const CRITICAL_FAILURE_COUNT: usize = 10;
    pub const DEGRADED_ERROR_RATE: f64 = 0.2;
    pub const DEGRADED_HIT_RATE: f64 = 0.5;
    pub const RECOVERING_ERROR_RATE: f64 = 0.1;
}

/// Failure predictor model shape and tuning
pub mod prediction {
    use std::time::Duration;

    pub const FEATURE_COUNT: usize = 6;

    /// Initial weights, ordered as the feature vector
    pub const INITIAL_WEIGHTS: [f64; FEATURE_COUNT] = [0.25, 0.15, 0.15, 0.15, 0.2, 0.1];

    /// Sigmoid input is `dot * SCALE_FACTOR + BIAS`
    pub const SCALE_FACTOR: f64 = 10.0;
    pub const BIAS: f64 = -5.0;

    pub const LEARNING_RATE: f64 = 0.01;
    pub const TRAINING_HISTORY_LIMIT: usize = 1000;
    /// Examples required before gradient steps start
    pub const MIN_TRAINING_EXAMPLES: usize = 10;
    /// Examples seen for full confidence
    pub const TRAINING_THRESHOLD: usize = 100;

    /// Probability at or above which a prediction counts as "predicted failure"
    pub const CLASSIFICATION_THRESHOLD: f64 = 0.6;
    /// Unresolved predictions kept before the oldest is dropped
    pub const PENDING_PREDICTION_LIMIT: usize = 1000;

    // Normalisation bounds
    pub const ERROR_TREND_BOUND: f64 = 0.1;
    pub const HIT_RATE_TREND_BOUND: f64 = 0.1;
    pub const RESPONSE_TREND_BOUND_MS: f64 = 100.0;
    pub const FAILURE_FREQUENCY_MAX: f64 = 20.0;
    pub const CURRENT_ERROR_RATE_MAX: f64 = 0.5;
    pub const MEMORY_PRESSURE_MB: f64 = 1024.0;

    /// Error rate at which the cache is considered failed
    pub const CRITICAL_ERROR_RATE: f64 = 0.5;
    /// Wall-clock length assumed for one trend step
    pub const TREND_TICK: Duration = Duration::from_secs(1);
    pub const MAX_TIME_TO_FAILURE: Duration = Duration::from_secs(3600);

    // Strategy ladder
    pub const CIRCUIT_BREAKER_PROBABILITY: f64 = 0.8;
    pub const CIRCUIT_BREAKER_ERROR_RATE: f64 = 0.4;
    pub const IMMEDIATE_REFRESH_PROBABILITY: f64 = 0.6;
    pub const GRADUAL_REFRESH_PROBABILITY: f64 = 0.4;
    pub const ADAPTIVE_PROBABILITY: f64 = 0.2;
}

/// Recovery manager caps, batch sizes and windows
pub mod recovery {
    pub const IMMEDIATE_MAX_KEYS: usize = 20;
    pub const IMMEDIATE_BATCH_SIZE: usize = 5;
    pub const IMMEDIATE_BATCH_PAUSE_MS: u64 = 100;

    pub const GRADUAL_MAX_KEYS: usize = 15;
    pub const GRADUAL_BATCH_SIZE: usize = 3;
    pub const GRADUAL_BATCH_PAUSE_MS: u64 = 500;

    pub const CIRCUIT_BREAKER_TIMEOUT_MS: u64 = 30_000;
    pub const CIRCUIT_BREAKER_STABILIZATION_MS: u64 = 1_000;
    pub const CIRCUIT_BREAKER_PROBE_KEYS: usize = 5;

    /// Failures after which a key is skipped until its record expires
    pub const MAX_KEY_FAILURES: u32 = 2;
    pub const KEY_FAILURE_WINDOW_MS: u64 = 60_000;

    pub const HISTORY_LIMIT: usize = 100;
    /// Actions required before `best_strategy` trusts the history
    pub const MIN_HISTORY_FOR_RANKING: usize = 10;

    // Adaptive dispatch bands
    pub const ADAPTIVE_CIRCUIT_ERROR_RATE: f64 = 0.3;
    pub const ADAPTIVE_GRADUAL_RESPONSE_MS: f64 = 1000.0;
    pub const ADAPTIVE_IMMEDIATE_HIT_RATE: f64 = 0.5;
}

/// Request-path defaults for the orchestrator
pub mod orchestration {
    pub const DEFAULT_MAX_REFRESH_ATTEMPTS: u32 = 2;
    pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 20;
    pub const DEFAULT_ML_SAMPLING_INTERVAL: u64 = 100;
    pub const DEFAULT_OUTCOME_RESOLUTION_DELAY_MS: u64 = 5_000;

    /// Keys handed to the recovery manager per self-healing pass
    pub const MAX_RECOVERY_CANDIDATES: usize = 100;
    /// Recent actions included in `stats()`
    pub const RECENT_HISTORY_IN_STATS: usize = 10;

    /// Error rate above which a healthy-looking sample is still worth training on
    pub const TRAINING_ERROR_RATE_FLOOR: f64 = 0.05;
    /// Error-rate increase that counts as a materialised failure
    pub const OUTCOME_ERROR_RATE_DELTA: f64 = 0.05;
}
