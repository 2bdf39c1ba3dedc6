//! Periodic eviction of expired tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::store::TaskStore;

/// Shortest interval the sweeper runs at; zero would panic in tokio.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Runs [`TaskStore::evict_expired`] on a fixed interval until stopped.
pub struct ExpirySweeper {
    store: Arc<TaskStore>,
    interval: Duration,
    shutdown: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Intervals below [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn new(store: Arc<TaskStore>, interval: Duration) -> Self {
        let interval = if interval < MIN_SWEEP_INTERVAL {
            log::warn!(
                "Sweep interval {:?} is too short, using {:?}",
                interval,
                MIN_SWEEP_INTERVAL
            );
            MIN_SWEEP_INTERVAL
        } else {
            interval
        };
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            interval,
            shutdown,
        }
    }

    /// Spawns the sweep loop on the current tokio runtime.
    pub fn start(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.tick().await; // skip immediate first tick

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let evicted = store.evict_expired();
                        log::debug!("Expiry sweep removed {} tasks", evicted);
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            log::debug!("Expiry sweeper stopped");
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Signals the sweep loop to exit.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }
}
