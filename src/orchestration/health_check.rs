//! Periodic health check task
//!
//! Holds only a weak reference to the cache state, so dropping the last
//! cache handle ends the loop even if `stop` was never called.

use super::core::CacheCore;
use crate::cache::StorageAdapter;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub(crate) struct HealthCheckTask {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl HealthCheckTask {
    pub(crate) fn spawn<V, S>(core: Weak<CacheCore<V, S>>, period: Duration) -> Self
    where
        V: Clone + Send + Sync + 'static,
        S: StorageAdapter<V> + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;

            info!(period_ms = period.as_millis() as u64, "🚀 Health check started");

            loop {
                tokio::select! {
                    // Fires on an explicit stop and when the sender is dropped
                    _ = &mut shutdown_rx => {
                        debug!("Health check received shutdown");
                        break;
                    }
                    _ = interval.tick() => {
                        let Some(core) = core.upgrade() else {
                            debug!("Cache dropped, health check exiting");
                            break;
                        };
                        core.run_health_check().await;
                    }
                }
            }

            info!("🛑 Health check stopped");
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Signal the loop and wait for an in-flight check to finish
    pub(crate) async fn shutdown(self) {
        // Receiver is gone if the loop already exited
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            debug!(error = %e, "Health check task ended abnormally");
        }
    }
}
