//! Periodic monitoring loop.
//!
//! Runs one pass immediately, then one per interval. A pass that overruns
//! its interval skips the missed tick instead of queueing overlapping
//! passes. Shutdown is cooperative: the current pass finishes, then the
//! loop returns.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::error::Result;
use crate::monitor::Monitor;

/// Signals the ticker to stop after its current pass.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

pub struct PassTicker {
    period: Duration,
    shutdown: watch::Receiver<bool>,
    _tx: watch::Sender<bool>,
}

impl PassTicker {
    pub fn new(period: Duration) -> (Self, ShutdownHandle) {
        let (tx, shutdown) = watch::channel(false);
        let handle = ShutdownHandle { tx: tx.clone() };
        (
            Self {
                period,
                shutdown,
                _tx: tx,
            },
            handle,
        )
    }

    pub fn from_hours(hours: u64) -> (Self, ShutdownHandle) {
        Self::new(Duration::from_secs(hours * 3600))
    }

    /// Drives the monitor until shutdown. A failed pass is logged and the
    /// loop keeps its schedule.
    pub async fn run(mut self, monitor: &mut Monitor) -> Result<()> {
        info!(period_secs = self.period.as_secs(), "monitoring started");

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick resolves immediately, giving the immediate pass.

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = monitor.run_pass().await {
                        error!(error = %e, "monitoring pass failed");
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("monitoring stopped");
                        return Ok(());
                    }
                }
            }
        }
    }
}
