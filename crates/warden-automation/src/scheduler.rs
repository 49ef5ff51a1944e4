//! Timer-driven reconciliation lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use warden_common::SessionEvent;

use crate::scan::Reconciler;

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs [`Reconciler::tick`] every `period` on one background task.
///
/// `start` and `stop` are idempotent. `stop` waits for an in-flight tick to
/// observe cancellation before returning.
pub struct ReconciliationLoop {
    reconciler: Arc<Reconciler>,
    period: Duration,
    running: Mutex<Option<Running>>,
}

impl ReconciliationLoop {
    pub fn new(reconciler: Arc<Reconciler>, period: Duration) -> Self {
        Self {
            reconciler,
            period,
            running: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns `false` if the loop was already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            debug!("reconciliation loop already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&self.reconciler),
            self.period,
            cancel.clone(),
        ));
        *running = Some(Running { cancel, handle });
        info!(period_secs = self.period.as_secs(), "reconciliation loop started");
        true
    }

    /// Returns `false` if the loop was not running.
    pub async fn stop(&self) -> bool {
        let mut running = self.running.lock().await;
        let Some(Running { cancel, handle }) = running.take() else {
            return false;
        };

        cancel.cancel();
        if let Err(e) = handle.await {
            if e.is_panic() {
                error!(error = %e, "reconciliation loop panicked");
            }
        }
        info!("reconciliation loop stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Follow session events: start when ready, stop otherwise.
    ///
    /// The returned task ends when `shutdown` fires or the bus closes, and
    /// stops the loop on its way out.
    pub fn attach(
        self: Arc<Self>,
        mut events: broadcast::Receiver<SessionEvent>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(event) if event.is_ready() => {
                        self.start().await;
                    }
                    Ok(_) => {
                        self.stop().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            self.stop().await;
        })
    }
}

async fn run(reconciler: Arc<Reconciler>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let report = reconciler.tick(&cancel).await;
        debug!(%report, "tick complete");
    }
}
