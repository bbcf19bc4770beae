//! # Resilience Module
//!
//! Recovery strategies and the circuit breaker that protects the request
//! path while the upstream source is struggling.
//!
//! ## Architecture
//!
//! - **Recovery Manager**: executes one of five strategies against a ranked key set
//! - **Circuit Breaker**: lazily timed open/half-open/closed state
//! - **Per-key bookkeeping**: active-recovery markers and failure suppression
//! - **Configuration**: batch sizes, caps and breaker timings
//!
//! ## Usage
//!
//! ```rust
//! use async_trait::async_trait;
//! use self_healing_cache::error::BoxError;
//! use self_healing_cache::health::HealthMetrics;
//! use self_healing_cache::resilience::{
//!     CircuitBreakerConfig, KeyRefresher, RecoveryConfig, RecoveryManager, RecoveryStrategy,
//! };
//!
//! struct Upstream;
//!
//! #[async_trait]
//! impl KeyRefresher for Upstream {
//!     async fn refresh(&self, _key: &str) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let manager = RecoveryManager::new(RecoveryConfig::default(), CircuitBreakerConfig::default());
//! let keys = vec!["user:1".to_string(), "user:2".to_string()];
//!
//! // A low hit rate dispatches to an immediate refresh
//! let metrics = HealthMetrics { hit_rate: 0.2, miss_rate: 0.8, total_requests: 50, ..HealthMetrics::idle() };
//! let action = manager
//!     .execute_recovery(RecoveryStrategy::Adaptive, &keys, &Upstream, &metrics)
//!     .await
//!     .unwrap();
//! assert_eq!(action.resolved_strategy, RecoveryStrategy::ImmediateRefresh);
//! assert_eq!(action.keys_refreshed, 2);
//! # });
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod recovery;
pub mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerMetrics, CircuitState};
pub use config::{CircuitBreakerConfig, RecoveryConfig};
pub use recovery::{RecoveryManager, RecoveryStats};
pub use types::{KeyRefresher, RecoveryAction, RecoveryStrategy};
