#![allow(clippy::doc_markdown)] // Allow technical terms like LRU, TTL in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Self-Healing Cache
//!
//! Adaptive in-process key-value cache that watches its own health and
//! repairs itself.
//!
//! ## Overview
//!
//! Alongside ordinary get/set/delete with TTL and LRU eviction, the cache
//! keeps rolling health metrics, feeds them to an online failure predictor
//! and, when it degrades, runs a recovery strategy that re-fetches its most
//! valuable keys through a user-supplied refresh function.
//!
//! ## Module Organization
//!
//! - [`cache`] - Entry store, TTL, LRU eviction and the storage adapter trait
//! - [`health`] - Metrics aggregation, trends and state classification
//! - [`prediction`] - Online logistic failure predictor and accuracy tracking
//! - [`resilience`] - Recovery strategies and the circuit breaker
//! - [`orchestration`] - The [`SelfHealingCache`] facade and its health check
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use self_healing_cache::{CacheConfig, SelfHealingCache};
//!
//! # async fn example() -> Result<(), self_healing_cache::CacheError> {
//! let cache: SelfHealingCache<String> = SelfHealingCache::new(CacheConfig::default())?;
//! cache.set_refresh_function(|key| async move { Ok(Some(format!("db row for {key}"))) });
//! cache.start();
//!
//! cache.set("user:1", "alice".to_string(), None).await?;
//! assert_eq!(cache.get("user:1").await?, Some("alice".to_string()));
//!
//! // Misses are loaded through the refresh function
//! let loaded = cache.get("user:2").await?;
//! println!("{loaded:?} {:?}", cache.health().await.state);
//!
//! cache.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                          # Unit, integration and property tests
//! cargo bench --features benchmarks   # Criterion benchmarks
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod health;
pub mod logging;
pub mod orchestration;
pub mod prediction;
pub mod resilience;

pub use cache::{CacheEntry, MemoryStore, StorageAdapter};
pub use config::{BackoffConfig, CacheConfig, ConfigManager, ConfigurationError};
pub use error::{BoxError, CacheError, CacheResult};
pub use health::{CacheState, HealthMetrics, HealthMonitor, HealthReport};
pub use orchestration::{CacheStats, SelfHealingCache, SelfHealingCacheBuilder};
pub use prediction::{AccuracyReport, FailurePrediction, FailurePredictor};
pub use resilience::{
    CircuitBreakerConfig, CircuitState, KeyRefresher, RecoveryAction, RecoveryConfig,
    RecoveryManager, RecoveryStrategy,
};
