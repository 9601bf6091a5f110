//! OrderStore trait definition.
//!
//! Core trait that all durability backends must implement.

use crate::core::{OrderStatus, Result};
use crate::ingest::MetricSample;
use crate::monitoring::{Alert, AlertChange};
use crate::registry::Order;
use crate::sla::{StatusChanged, StatusTracker};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Backend type identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// In-process, lost on restart
    Memory,
    /// Append-only JSON lines file
    Journal,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Memory => write!(f, "memory"),
            BackendType::Journal => write!(f, "journal"),
        }
    }
}

/// Everything one ingestion changes, written as a single record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IngestRecord {
    /// Accepted sample
    pub sample: MetricSample,
    /// Order status after evaluation
    pub status: OrderStatus,
    /// Transition, when the status changed
    pub transition: Option<StatusChanged>,
    /// Alert change caused by the transition
    pub alert: Option<AlertChange>,
}

/// Full state of one order, written when the journal is compacted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Order record with its current status
    pub order: Order,
    /// Status bookkeeping
    pub tracker: StatusTracker,
    /// Retained samples, oldest first
    pub samples: Vec<MetricSample>,
    /// Open alert
    pub open_alert: Option<Alert>,
    /// Retained closed alerts, oldest first
    pub closed_alerts: Vec<Alert>,
}

/// A durable journal record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JournalRecord {
    /// A new order
    OrderCreated(Order),
    /// An accepted sample and its consequences
    SampleIngested(IngestRecord),
    /// Compacted order state
    OrderSnapshot(OrderSnapshot),
}

/// Core trait for durability backends.
///
/// `append` must be all-or-nothing from the engine's point of view: when it
/// returns an error, the engine leaves in-memory state untouched.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Durably append a record.
    async fn append(&self, record: &JournalRecord) -> Result<()>;

    /// Read back every record in append order.
    async fn load(&self) -> Result<Vec<JournalRecord>>;

    /// Atomically replace the journal with `records`.
    async fn compact(&self, records: &[JournalRecord]) -> Result<()>;

    /// Get the backend type.
    fn backend_type(&self) -> BackendType;

    /// Health check for the backend.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Get record count (if supported).
    async fn count(&self) -> Result<u64> {
        Ok(0)
    }
}
