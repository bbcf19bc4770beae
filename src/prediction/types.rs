//! Prediction result and model statistics types

use super::features::FeatureVector;
use crate::constants::prediction::CLASSIFICATION_THRESHOLD;
use crate::resilience::RecoveryStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Identifier pairing a prediction with its later outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionId(Uuid);

impl PredictionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PredictionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PredictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Output of a single `predict` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailurePrediction {
    pub id: PredictionId,
    /// Failure probability in [0, 1]
    pub probability: f64,
    /// `None` when no failure is expected (non-positive error trend)
    #[serde(
        rename = "estimated_time_to_failure_ms",
        serialize_with = "serialize_optional_millis"
    )]
    pub estimated_time_to_failure: Option<Duration>,
    /// Training maturity in [0, 1]
    pub confidence: f64,
    pub recommended_strategy: RecoveryStrategy,
    pub features: FeatureVector,
    pub created_at: DateTime<Utc>,
}

impl FailurePrediction {
    /// Whether this prediction counts as "failure predicted" for accuracy
    pub fn predicts_failure(&self) -> bool {
        self.probability >= CLASSIFICATION_THRESHOLD
    }
}

fn serialize_optional_millis<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}

/// Labelled example retained for training
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingExample {
    pub features: FeatureVector,
    pub actual_failure: bool,
}

/// Model state summary for `stats()`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStats {
    /// Examples currently retained in the rolling history
    pub data_points: usize,
    /// Examples seen since the last reset, including evicted ones
    pub examples_seen: u64,
    pub weights: Vec<f64>,
    pub confidence: f64,
}
