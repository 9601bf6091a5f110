//! Background metric scheduler.
//!
//! Every tick simulates one random reading for each registered order.

use crate::engine::service::SlaEngine;
use crate::engine::simulator::SimulateRequest;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Outcome of one scheduler tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Orders that received a reading
    pub ingested: usize,
    /// Orders whose reading was rejected
    pub failed: usize,
}

/// Periodic reading generator.
pub struct MetricScheduler;

impl MetricScheduler {
    /// Start ticking every `interval`. The first tick fires after one interval.
    pub fn spawn(engine: Arc<SlaEngine>, interval: Duration) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_ms = interval.as_millis() as u64, "metric scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = Self::tick(&engine).await;
                        debug!(ingested = report.ingested, failed = report.failed, "scheduler tick");
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("metric scheduler stopped");
        });

        SchedulerHandle { shutdown_tx, task }
    }

    /// Simulate one reading for every order.
    pub async fn tick(engine: &SlaEngine) -> TickReport {
        let ids = engine.registry().ids().await;
        let request = SimulateRequest::default();

        let results = join_all(ids.iter().map(|id| engine.simulate(*id, &request))).await;

        let mut report = TickReport::default();
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(_) => report.ingested += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(order_id = %id, error = %e, "scheduled reading failed");
                }
            }
        }
        report
    }
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the scheduler and wait for the current tick to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "metric scheduler task failed");
        }
    }
}
