//! # Health Monitoring
//!
//! Turns raw request outcomes into health snapshots and a four-level
//! [`CacheState`]. The orchestrator records every hit, miss, error and
//! response time here; the failure predictor consumes the resulting metrics
//! and trends.

pub mod monitor;
pub mod types;

pub use monitor::{HealthMonitor, RequestCounters};
pub use types::{CacheState, HealthMetrics, HealthReport, MetricKind};
