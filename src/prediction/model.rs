//! # Failure Predictor
//!
//! Fixed-shape online logistic model over six health features. Produces a
//! failure probability, a time-to-failure estimate and a recommended recovery
//! strategy, and learns one gradient step per labelled example.
//!
//! After each gradient step the weights are rescaled by the sum of their
//! absolute values, keeping the L1 norm at 1. Note this also shrinks the
//! effective learning rate as the weights grow.

use super::accuracy::{AccuracyReport, AccuracyTracker};
use super::features::FeatureVector;
use super::types::{FailurePrediction, ModelStats, PredictionId, TrainingExample};
use crate::constants::prediction::*;
use crate::health::HealthMetrics;
use crate::resilience::RecoveryStrategy;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug)]
struct ModelState {
    weights: [f64; FEATURE_COUNT],
    history: VecDeque<TrainingExample>,
    examples_seen: u64,
}

impl Default for ModelState {
    fn default() -> Self {
        Self {
            weights: INITIAL_WEIGHTS,
            history: VecDeque::new(),
            examples_seen: 0,
        }
    }
}

impl ModelState {
    fn confidence(&self) -> f64 {
        (self.examples_seen as f64 / TRAINING_THRESHOLD as f64).min(1.0)
    }
}

/// Online failure predictor
#[derive(Debug, Default)]
pub struct FailurePredictor {
    model: Mutex<ModelState>,
    accuracy: AccuracyTracker,
}

impl FailurePredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Predict failure from a metrics snapshot and its trends
    ///
    /// Each prediction is registered for accuracy tracking under its ID until
    /// an outcome is recorded for it.
    pub fn predict(
        &self,
        metrics: &HealthMetrics,
        error_trend: f64,
        hit_trend: f64,
        response_trend: f64,
        failure_frequency: usize,
    ) -> FailurePrediction {
        let features = FeatureVector::from_signals(
            metrics,
            error_trend,
            hit_trend,
            response_trend,
            failure_frequency,
        );

        let (probability, confidence) = {
            let model = self.model.lock();
            (probability(&model.weights, &features), model.confidence())
        };

        let prediction = FailurePrediction {
            id: PredictionId::new(),
            probability,
            estimated_time_to_failure: estimate_time_to_failure(metrics.error_rate, error_trend),
            confidence,
            recommended_strategy: recommend_strategy(probability, metrics.error_rate),
            features,
            created_at: Utc::now(),
        };

        self.accuracy
            .register(prediction.id, prediction.predicts_failure());

        debug!(
            prediction_id = %prediction.id,
            probability = prediction.probability,
            confidence = prediction.confidence,
            strategy = %prediction.recommended_strategy,
            "Failure prediction"
        );

        prediction
    }

    /// Add a labelled example and, once enough exist, take one gradient step
    pub fn learn(&self, features: FeatureVector, actual_failure: bool) {
        let mut model = self.model.lock();
        model.history.push_back(TrainingExample {
            features,
            actual_failure,
        });
        while model.history.len() > TRAINING_HISTORY_LIMIT {
            model.history.pop_front();
        }
        model.examples_seen += 1;

        if model.history.len() < MIN_TRAINING_EXAMPLES {
            return;
        }

        let label = if actual_failure { 1.0 } else { 0.0 };
        let error = label - probability(&model.weights, &features);
        let values = features.as_array();
        for (weight, value) in model.weights.iter_mut().zip(values) {
            *weight += LEARNING_RATE * error * value;
        }

        let norm: f64 = model.weights.iter().map(|w| w.abs()).sum();
        if norm > 0.0 && norm.is_finite() {
            for weight in model.weights.iter_mut() {
                *weight /= norm;
            }
        } else {
            warn!(norm = norm, "Degenerate model weights, restoring initial weights");
            model.weights = INITIAL_WEIGHTS;
        }
    }

    /// Resolve a specific prediction; false if it is unknown or already resolved
    pub fn record_outcome(&self, id: PredictionId, actual_failure: bool) -> bool {
        self.accuracy.resolve(id, actual_failure)
    }

    /// Resolve the most recent unresolved prediction
    pub fn record_actual_outcome(&self, actual_failure: bool) -> Option<PredictionId> {
        self.accuracy.resolve_latest(actual_failure)
    }

    pub fn accuracy_report(&self) -> AccuracyReport {
        self.accuracy.report()
    }

    pub fn pending_predictions(&self) -> usize {
        self.accuracy.pending_count()
    }

    pub fn confidence(&self) -> f64 {
        self.model.lock().confidence()
    }

    pub fn model_stats(&self) -> ModelStats {
        let model = self.model.lock();
        ModelStats {
            data_points: model.history.len(),
            examples_seen: model.examples_seen,
            weights: model.weights.to_vec(),
            confidence: model.confidence(),
        }
    }

    /// Restore initial weights and drop all training and accuracy data
    pub fn reset(&self) {
        *self.model.lock() = ModelState::default();
        self.accuracy.reset();
    }
}

fn probability(weights: &[f64; FEATURE_COUNT], features: &FeatureVector) -> f64 {
    let dot: f64 = weights
        .iter()
        .zip(features.as_array())
        .map(|(weight, value)| weight * value)
        .sum();
    sigmoid(dot * SCALE_FACTOR + BIAS)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Linear extrapolation of the error rate to the critical threshold
fn estimate_time_to_failure(error_rate: f64, error_trend: f64) -> Option<Duration> {
    if error_trend.is_nan() || error_trend <= 0.0 {
        return None;
    }

    let ticks = ((CRITICAL_ERROR_RATE - error_rate) / error_trend).max(0.0);
    let seconds = (ticks * TREND_TICK.as_secs_f64()).min(MAX_TIME_TO_FAILURE.as_secs_f64());
    Some(Duration::from_secs_f64(seconds))
}

fn recommend_strategy(probability: f64, error_rate: f64) -> RecoveryStrategy {
    if probability > CIRCUIT_BREAKER_PROBABILITY || error_rate > CIRCUIT_BREAKER_ERROR_RATE {
        RecoveryStrategy::CircuitBreaker
    } else if probability > IMMEDIATE_REFRESH_PROBABILITY {
        RecoveryStrategy::ImmediateRefresh
    } else if probability > GRADUAL_REFRESH_PROBABILITY {
        RecoveryStrategy::GradualRefresh
    } else if probability > ADAPTIVE_PROBABILITY {
        RecoveryStrategy::Adaptive
    } else {
        RecoveryStrategy::Fallback
    }
}
