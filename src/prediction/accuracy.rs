//! Prediction accuracy tracking
//!
//! Every prediction is registered under its [`PredictionId`] and later
//! resolved against the failure that did (or did not) materialise. Resolution
//! by ID is exact; [`AccuracyTracker::resolve_latest`] pairs with the most
//! recent unresolved prediction instead.

use super::types::PredictionId;
use crate::constants::prediction::PENDING_PREDICTION_LIMIT;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Confusion-matrix counts and derived scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub true_positives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
    pub false_negatives: u64,
    pub total_predictions: u64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, Copy)]
struct PendingPrediction {
    predicted_failure: bool,
    sequence: u64,
}

#[derive(Debug, Default)]
struct TrackerState {
    pending: HashMap<PredictionId, PendingPrediction>,
    next_sequence: u64,
    true_positives: u64,
    false_positives: u64,
    true_negatives: u64,
    false_negatives: u64,
}

impl TrackerState {
    fn record(&mut self, predicted_failure: bool, actual_failure: bool) {
        match (predicted_failure, actual_failure) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct AccuracyTracker {
    state: Mutex<TrackerState>,
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unresolved prediction
    pub fn register(&self, id: PredictionId, predicted_failure: bool) {
        let mut state = self.state.lock();
        state.next_sequence += 1;
        let sequence = state.next_sequence;
        state.pending.insert(
            id,
            PendingPrediction {
                predicted_failure,
                sequence,
            },
        );

        if state.pending.len() > PENDING_PREDICTION_LIMIT {
            let oldest = state
                .pending
                .iter()
                .min_by_key(|(_, pending)| pending.sequence)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                state.pending.remove(&oldest);
                debug!(prediction_id = %oldest, "Dropped unresolved prediction");
            }
        }
    }

    /// Resolve one prediction; false when the ID is unknown or already resolved
    pub fn resolve(&self, id: PredictionId, actual_failure: bool) -> bool {
        let mut state = self.state.lock();
        match state.pending.remove(&id) {
            Some(pending) => {
                state.record(pending.predicted_failure, actual_failure);
                true
            }
            None => false,
        }
    }

    /// Resolve the most recent unresolved prediction
    pub fn resolve_latest(&self, actual_failure: bool) -> Option<PredictionId> {
        let mut state = self.state.lock();
        let latest = state
            .pending
            .iter()
            .max_by_key(|(_, pending)| pending.sequence)
            .map(|(id, _)| *id)?;

        let pending = state.pending.remove(&latest)?;
        state.record(pending.predicted_failure, actual_failure);
        Some(latest)
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn report(&self) -> AccuracyReport {
        let state = self.state.lock();
        let tp = state.true_positives as f64;
        let fp = state.false_positives as f64;
        let tn = state.true_negatives as f64;
        let fn_ = state.false_negatives as f64;
        let total = state.true_positives
            + state.false_positives
            + state.true_negatives
            + state.false_negatives;

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = ratio(2.0 * precision * recall, precision + recall);

        AccuracyReport {
            true_positives: state.true_positives,
            false_positives: state.false_positives,
            true_negatives: state.true_negatives,
            false_negatives: state.false_negatives,
            total_predictions: total,
            accuracy: ratio(tp + tn, total as f64),
            precision,
            recall,
            f1_score,
        }
    }

    pub fn reset(&self) {
        *self.state.lock() = TrackerState::default();
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
