//! # Cache Simulator
//!
//! Drives a self-healing cache against a flaky in-process upstream so the
//! health check, predictor and recovery loop can be watched in the logs.
//!
//! ```bash
//! cache_simulator [config.toml]
//! ```
//!
//! The upstream fails with probability `SIM_FAILURE_RATE` (default 0.3) for
//! the first half of the run and recovers for the second half. Final stats
//! are printed as JSON.

use anyhow::Context;
use rand::Rng;
use self_healing_cache::config::ConfigManager;
use self_healing_cache::constants::system;
use self_healing_cache::logging::init_structured_logging;
use self_healing_cache::{BoxError, SelfHealingCache};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const ROUNDS: u64 = 2_000;
const KEY_SPACE: u64 = 500;

#[derive(Debug)]
struct FlakyUpstream {
    degraded: AtomicBool,
    failure_rate_bits: AtomicU64,
    calls: AtomicU64,
}

impl FlakyUpstream {
    fn new(failure_rate: f64) -> Self {
        Self {
            degraded: AtomicBool::new(true),
            failure_rate_bits: AtomicU64::new(failure_rate.to_bits()),
            calls: AtomicU64::new(0),
        }
    }

    fn fetch(&self, key: &str) -> Result<Option<String>, BoxError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let failure_rate = f64::from_bits(self.failure_rate_bits.load(Ordering::Relaxed));

        if self.degraded.load(Ordering::Relaxed) && rand::thread_rng().gen_bool(failure_rate) {
            return Err(format!("upstream timeout fetching {key}").into());
        }
        Ok(Some(format!("value:{key}")))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let path = std::env::args().nth(1).map(PathBuf::from);
    let manager = ConfigManager::load_with_prefix(path.as_deref(), system::ENV_PREFIX)
        .context("failed to load cache configuration")?;

    let failure_rate = std::env::var("SIM_FAILURE_RATE")
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(0.3)
        .clamp(0.0, 1.0);

    let upstream = Arc::new(FlakyUpstream::new(failure_rate));
    let cache: SelfHealingCache<String> = SelfHealingCache::new(manager.config().clone())
        .context("failed to build cache")?;

    let source = upstream.clone();
    cache.set_refresh_function(move |key| {
        let source = source.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            source.fetch(&key)
        }
    });

    cache.start();
    info!(
        environment = manager.environment(),
        failure_rate = failure_rate,
        rounds = ROUNDS,
        "🚀 Simulation started"
    );

    let mut upstream_failures = 0u64;
    for round in 0..ROUNDS {
        if round == ROUNDS / 2 {
            upstream.degraded.store(false, Ordering::Relaxed);
            info!(round = round, "✅ Upstream recovered");
        }

        let key = format!("key:{}", rand::thread_rng().gen_range(0..KEY_SPACE));
        if let Err(e) = cache.get(&key).await {
            upstream_failures += 1;
            if upstream_failures % 100 == 1 {
                warn!(error = %e, failures = upstream_failures, "Upstream failures surfacing");
            }
        }

        if round % 50 == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    cache.run_health_check().await;
    cache.stop().await;

    let stats = cache.stats().await.context("failed to collect stats")?;
    info!(
        upstream_calls = upstream.calls.load(Ordering::Relaxed),
        upstream_failures = upstream_failures,
        state = %stats.health.state,
        "🏁 Simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
