//! The long-running watch loop.
//!
//! Repeats scan cycles on an interval. Shutdown is cooperative: the signal
//! stops scheduling new cycles, the in-flight cycle runs to completion and
//! persists its state, and only then does the loop exit.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use fovea_core::{Error, Result, ScanEvent};

use crate::orchestrator::Orchestrator;

/// Handle for controlling a running watcher.
pub struct WatcherHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

impl WatcherHandle {
    /// Signal the watcher to shut down after the in-flight cycle.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("watcher already stopped".to_string()))
    }

    /// Wait for the watch loop to exit.
    pub async fn join(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| Error::Internal(format!("watcher task panicked: {}", e)))
    }
}

/// Periodic scan driver over an [`Orchestrator`].
pub struct Watcher {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
}

impl Watcher {
    /// Watch with the orchestrator's configured scan interval.
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let interval = Duration::from_secs(orchestrator.scan_interval_secs());
        Self {
            orchestrator,
            interval,
        }
    }

    /// Override the cycle interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the watch loop and return a control handle.
    pub fn start(self) -> WatcherHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });
        WatcherHandle { shutdown_tx, join }
    }

    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        info!(interval_secs = self.interval.as_secs(), "watcher started");
        self.orchestrator.event_bus().emit(ScanEvent::WatcherStarted);

        loop {
            // A signal that arrived during the previous cycle stops the
            // loop before another cycle is scheduled.
            if shutdown_rx.try_recv().is_ok() {
                info!("watcher received shutdown signal");
                break;
            }

            let result = self.orchestrator.run_scan().await;
            debug!(
                status = ?result.status,
                found = result.found,
                written = result.written,
                errors = result.errors,
                "scan cycle finished"
            );

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("watcher received shutdown signal");
                    break;
                }
                _ = sleep(self.interval) => {}
            }
        }

        self.orchestrator.event_bus().emit(ScanEvent::WatcherStopped);
        info!("watcher stopped");
    }
}
