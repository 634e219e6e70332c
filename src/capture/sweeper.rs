use super::registry::SessionRegistry;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// `tokio::time::interval` panics on a zero period
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Background task that periodically evicts idle capture sessions
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    task_handle: JoinHandle<()>,
}

impl Sweeper {
    /// Start sweeping `registry` every `every` (at least 1ms)
    pub fn spawn(registry: Arc<SessionRegistry>, every: Duration) -> Self {
        let every = every.max(MIN_SWEEP_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task_handle = tokio::spawn(async move {
            info!("Session sweeper started (every {:?})", every);

            let mut tick = interval(every);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let swept = registry.sweep_expired().await;
                        if swept > 0 {
                            info!("Swept {} expired capture sessions", swept);
                        }
                    }
                    // Also fires if the Sweeper is dropped without stop()
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("Session sweeper stopped");
        });

        Self {
            shutdown_tx,
            task_handle,
        }
    }

    /// Signal the task to finish and wait for it
    pub async fn stop(self) -> Result<()> {
        self.shutdown_tx.send(true).ok();
        self.task_handle.await.context("Sweeper task panicked")?;
        Ok(())
    }
}
