//! # Circuit Breaker Implementation
//!
//! Fault isolation for the request path. While the breaker is open every
//! `get` short-circuits to a miss instead of reaching the upstream source.
//! Three states: Closed (normal operation), Open (failing fast) and
//! Half-Open (recovery is probing a few keys).
//!
//! There is no timer: the open-to-closed timeout is evaluated lazily on
//! every [`CircuitBreaker::is_open`] / [`CircuitBreaker::state`] query.

use super::config::CircuitBreakerConfig;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Get current epoch nanos from SystemTime
#[inline]
fn epoch_nanos_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos() as u64
}

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - requests reach the store and upstream
    Closed = 0,
    /// Failure mode - requests short-circuit to a miss
    Open = 1,
    /// Probing - recovery is testing a small key sample, requests still short-circuit
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

/// Snapshot of breaker state and transition counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerMetrics {
    pub current_state: CircuitState,
    pub times_opened: u64,
    /// Closes triggered by the timeout rather than a successful probe
    pub auto_closed: u64,
    pub opened_at: Option<DateTime<Utc>>,
}

/// Lazily timed circuit breaker with atomic state
#[derive(Debug)]
pub struct CircuitBreaker {
    state: AtomicU8,
    /// Epoch nanos of the last open, 0 while closed
    opened_at_nanos: AtomicU64,
    times_opened: AtomicU64,
    auto_closed: AtomicU64,
    timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed as u8),
            opened_at_nanos: AtomicU64::new(0),
            times_opened: AtomicU64::new(0),
            auto_closed: AtomicU64::new(0),
            timeout: config.timeout(),
        }
    }

    /// Current state, closing the breaker first if its timeout has elapsed
    pub fn state(&self) -> CircuitState {
        let state = CircuitState::from(self.state.load(Ordering::Acquire));
        if state == CircuitState::Closed {
            return state;
        }

        let opened_at = self.opened_at_nanos.load(Ordering::Acquire);
        let elapsed = Duration::from_nanos(epoch_nanos_now().saturating_sub(opened_at));
        if elapsed <= self.timeout {
            return state;
        }

        // Only one caller wins the transition and logs it
        if self
            .state
            .compare_exchange(
                state as u8,
                CircuitState::Closed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.opened_at_nanos.store(0, Ordering::Release);
            self.auto_closed.fetch_add(1, Ordering::Relaxed);
            info!(
                open_ms = elapsed.as_millis() as u64,
                timeout_ms = self.timeout.as_millis() as u64,
                "🟢 Circuit breaker closed after timeout"
            );
        }

        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Whether requests should short-circuit
    pub fn is_open(&self) -> bool {
        self.state() != CircuitState::Closed
    }

    /// Open the breaker, restarting the timeout if it was already open
    pub fn open(&self) {
        self.opened_at_nanos
            .store(epoch_nanos_now(), Ordering::Release);
        let previous = self.state.swap(CircuitState::Open as u8, Ordering::AcqRel);
        self.times_opened.fetch_add(1, Ordering::Relaxed);

        warn!(
            previous_state = ?CircuitState::from(previous),
            timeout_ms = self.timeout.as_millis() as u64,
            "🔴 Circuit breaker opened (failing fast)"
        );
    }

    /// Enter the probe phase; the open timer keeps running
    pub fn half_open(&self) {
        self.state
            .store(CircuitState::HalfOpen as u8, Ordering::Release);
        info!("🟡 Circuit breaker half-open (probing)");
    }

    pub fn close(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::Release);
        self.opened_at_nanos.store(0, Ordering::Release);
        info!("🟢 Circuit breaker closed (recovered)");
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let current_state = self.state();
        let opened_at_nanos = self.opened_at_nanos.load(Ordering::Acquire);
        let opened_at = (opened_at_nanos > 0 && current_state != CircuitState::Closed)
            .then(|| Utc.timestamp_nanos(opened_at_nanos as i64));

        CircuitBreakerMetrics {
            current_state,
            times_opened: self.times_opened.load(Ordering::Relaxed),
            auto_closed: self.auto_closed.load(Ordering::Relaxed),
            opened_at,
        }
    }

    /// Close and clear transition counts
    pub fn reset(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::Release);
        self.opened_at_nanos.store(0, Ordering::Release);
        self.times_opened.store(0, Ordering::Relaxed);
        self.auto_closed.store(0, Ordering::Relaxed);
    }
}
