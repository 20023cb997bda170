use std::sync::Arc;

use tokio::sync::Notify;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::services::allocation::AllocationEngine;
use crate::PriorityUpgrade;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Periodically runs the fairness pass over every slot, so that starved
/// patients keep getting promoted without a caller driving each call.
pub struct StarvationSweeper {
    engine: Arc<AllocationEngine>,
    interval: Duration,
    shutdown_signal: Notify,
}

impl StarvationSweeper {
    pub fn new(engine: Arc<AllocationEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval: interval.max(MIN_SWEEP_INTERVAL),
            shutdown_signal: Notify::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn sweep_once(&self) -> Vec<PriorityUpgrade> {
        let upgrades = self.engine.relieve_all().await;
        if upgrades.is_empty() {
            debug!("Starvation sweep found nothing to upgrade");
        } else {
            info!("Starvation sweep upgraded {} token(s)", upgrades.len());
        }
        upgrades
    }

    /// Sweeps on every tick until [`StarvationSweeper::shutdown`] is called.
    #[instrument(skip(self), fields(interval_ms = self.interval.as_millis() as u64))]
    pub async fn run(&self) {
        info!("Starting starvation sweeper");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.shutdown_signal.notified() => {
                    debug!("Starvation sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }

        info!("Starvation sweeper stopped");
    }

    /// Stops a running sweeper without waiting for the next tick. A call made
    /// before [`StarvationSweeper::run`] starts is remembered.
    pub fn shutdown(&self) {
        self.shutdown_signal.notify_one();
    }
}
