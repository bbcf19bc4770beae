//! # Failure Prediction
//!
//! Online learned failure predictor. The orchestrator samples it every Nth
//! request and on each self-healing pass; its recommendation selects the
//! recovery strategy once its confidence and probability both clear the
//! configured threshold.
//!
//! ## Usage
//!
//! ```rust
//! use self_healing_cache::health::HealthMetrics;
//! use self_healing_cache::prediction::FailurePredictor;
//!
//! let predictor = FailurePredictor::new();
//! let metrics = HealthMetrics { error_rate: 0.01, hit_rate: 0.99, total_requests: 100, ..HealthMetrics::idle() };
//!
//! let prediction = predictor.predict(&metrics, 0.0, 0.0, 0.0, 0);
//! assert!(prediction.probability < 0.3);
//!
//! // Later, once the outcome is known
//! predictor.record_outcome(prediction.id, false);
//! assert_eq!(predictor.accuracy_report().true_negatives, 1);
//! ```

pub mod accuracy;
pub mod features;
pub mod model;
pub mod types;

pub use accuracy::{AccuracyReport, AccuracyTracker};
pub use features::FeatureVector;
pub use model::FailurePredictor;
pub use types::{FailurePrediction, ModelStats, PredictionId, TrainingExample};
