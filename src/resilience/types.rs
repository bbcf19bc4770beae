//! Recovery strategy and action types

use crate::error::{BoxError, CacheError};
use crate::health::HealthMetrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Recovery strategies the manager can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryStrategy {
    /// Refresh up to 20 hot keys in batches of 5
    ImmediateRefresh,
    /// Refresh up to 15 hot keys in batches of 3 with longer pauses
    GradualRefresh,
    /// Open the breaker, probe, then close and refresh gradually
    CircuitBreaker,
    /// No eager work; clear active-recovery markers
    Fallback,
    /// Pick one of the above from the metrics snapshot
    Adaptive,
}

impl RecoveryStrategy {
    pub const ALL: [RecoveryStrategy; 5] = [
        RecoveryStrategy::ImmediateRefresh,
        RecoveryStrategy::GradualRefresh,
        RecoveryStrategy::CircuitBreaker,
        RecoveryStrategy::Fallback,
        RecoveryStrategy::Adaptive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::ImmediateRefresh => "IMMEDIATE_REFRESH",
            RecoveryStrategy::GradualRefresh => "GRADUAL_REFRESH",
            RecoveryStrategy::CircuitBreaker => "CIRCUIT_BREAKER",
            RecoveryStrategy::Fallback => "FALLBACK",
            RecoveryStrategy::Adaptive => "ADAPTIVE",
        }
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecoveryStrategy {
    type Err = CacheError;

    /// Case-insensitive; `-` and `_` are interchangeable
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        RecoveryStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| CacheError::UnknownStrategy(s.to_string()))
    }
}

/// Log record of one `execute_recovery` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryAction {
    pub id: Uuid,
    /// Strategy that was requested
    pub strategy: RecoveryStrategy,
    /// Strategy that actually ran (differs only for `Adaptive`)
    pub resolved_strategy: RecoveryStrategy,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub duration_ms: u64,
    pub keys_attempted: usize,
    pub keys_refreshed: usize,
    pub keys_failed: usize,
    /// Keys passed over because they were already recovering or had failed too often
    pub keys_skipped: usize,
    pub metrics_before: HealthMetrics,
    /// Back-filled by the orchestrator once recovery has finished
    pub metrics_after: Option<HealthMetrics>,
    pub error: Option<String>,
}

/// Refreshes a single key from the upstream source into storage
#[async_trait]
pub trait KeyRefresher: Send + Sync {
    async fn refresh(&self, key: &str) -> Result<(), BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in RecoveryStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<RecoveryStrategy>().unwrap(), strategy);
            assert_eq!(
                serde_json::to_string(&strategy).unwrap(),
                format!("\"{}\"", strategy.as_str())
            );
        }
    }

    #[test]
    fn test_strategy_parsing_is_lenient_about_case() {
        assert_eq!(
            "gradual-refresh".parse::<RecoveryStrategy>().unwrap(),
            RecoveryStrategy::GradualRefresh
        );
        assert_eq!(
            " circuit_breaker ".parse::<RecoveryStrategy>().unwrap(),
            RecoveryStrategy::CircuitBreaker
        );
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let err = "REBOOT".parse::<RecoveryStrategy>().unwrap_err();
        assert!(matches!(err, CacheError::UnknownStrategy(name) if name == "REBOOT"));
    }
}
