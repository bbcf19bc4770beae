//! # Backoff Calculator
//!
//! Delays between refresh attempts on the request path: exponential growth
//! from a base delay, capped, with optional jitter to avoid synchronised
//! retries against the upstream source.

use crate::config::BackoffConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BackoffCalculator {
    config: BackoffConfig,
}

impl BackoffCalculator {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    /// Delay to wait after `failed_attempts` consecutive failures
    ///
    /// `base * multiplier^(failed_attempts - 1)`, capped at the maximum delay:
    /// 20ms, 40ms, 80ms... with the defaults.
    pub fn delay_for_attempt(&self, failed_attempts: u32) -> Duration {
        if failed_attempts == 0 {
            return Duration::ZERO;
        }

        let exponent = (failed_attempts - 1).min(i32::MAX as u32) as i32;
        let raw = self.config.base_delay_ms as f64 * self.config.multiplier.powi(exponent);
        let capped = raw.min(self.config.max_delay_ms as f64).max(0.0) as u64;

        let delay_ms = if self.config.jitter_enabled {
            self.apply_jitter(capped)
        } else {
            capped
        };

        Duration::from_millis(delay_ms)
    }

    fn apply_jitter(&self, delay_ms: u64) -> u64 {
        use rand::Rng;

        let jitter_range = (delay_ms as f64 * self.config.max_jitter) as u64;
        if jitter_range == 0 {
            return delay_ms;
        }

        let mut rng = rand::thread_rng();
        let jitter = rng.gen_range(0..=jitter_range);

        // Add or subtract jitter randomly
        if rng.gen_bool(0.5) {
            delay_ms.saturating_add(jitter)
        } else {
            delay_ms.saturating_sub(jitter)
        }
    }
}
