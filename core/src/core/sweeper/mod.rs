//! Background reclamation task.
//!
//! Runs [`EntryStore::sweep`] once at startup and then on a fixed interval
//! until its cancellation token fires.

use crate::core::EntryStore;
use crate::core::clock::Clock;
use crate::types::SweepConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub struct Sweeper<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl<S: EntryStore + 'static> Sweeper<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: SweepConfig) -> Self {
        Self {
            store,
            clock,
            // tokio's interval rejects a zero period.
            interval: config.interval.max(Duration::from_millis(1)),
        }
    }

    /// Spawns the loop on the current tokio runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs_f64(), "Sweeper started");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Sweeper received cancellation signal");
                    return;
                }
                _ = ticker.tick() => {}
            }

            // A pass that has started runs to completion.
            self.sweep_once().await;
        }
    }

    async fn sweep_once(&self) {
        let store = Arc::clone(&self.store);
        let now = self.clock.now();

        match tokio::task::spawn_blocking(move || store.sweep(now)).await {
            Ok(Ok(outcome)) => debug!(
                entries = outcome.entries_removed.len(),
                failures = outcome.failures,
                "Sweep pass finished"
            ),
            Ok(Err(e)) => error!(error = %e, "Sweep pass failed"),
            Err(e) => error!(error = %e, "Sweep pass panicked"),
        }
    }
}
