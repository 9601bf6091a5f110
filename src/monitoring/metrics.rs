//! Engine counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric (monotonically increasing).
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment by amount.
    pub fn add(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    /// Get current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Counters maintained by the engine.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub orders_created: Counter,
    pub samples_ingested: Counter,
    pub ingest_failures: Counter,
    pub status_changes: Counter,
    pub alerts_opened: Counter,
    pub alerts_closed: Counter,
}

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub orders_created: u64,
    pub samples_ingested: u64,
    pub ingest_failures: u64,
    pub status_changes: u64,
    pub alerts_opened: u64,
    pub alerts_closed: u64,
}

impl EngineMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            orders_created: self.orders_created.get(),
            samples_ingested: self.samples_ingested.get(),
            ingest_failures: self.ingest_failures.get(),
            status_changes: self.status_changes.get(),
            alerts_opened: self.alerts_opened.get(),
            alerts_closed: self.alerts_closed.get(),
        }
    }
}
