//! Per-order status tracking.
//!
//! States: PENDING (initial), OK, DEGRADED, BREACHED. No terminal state.
//! A transition is emitted only when the window verdict differs from the
//! stored status, so a stable breach produces exactly one event.

use crate::core::{OrderId, OrderStatus, Timestamp};
use crate::ingest::MetricSample;
use crate::registry::Order;
use crate::sla::evaluator::Evaluation;
use serde::{Deserialize, Serialize};

/// Emitted when an order's status changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusChanged {
    /// Order whose status changed
    pub order_id: OrderId,
    /// Status before the transition
    pub old_status: OrderStatus,
    /// Status after the transition
    pub new_status: OrderStatus,
    /// Sample that completed the deciding window
    pub sample: MetricSample,
    /// Human-readable cause
    pub details: String,
}

impl StatusChanged {
    /// Whether the new status is more severe than the old one.
    pub fn is_escalation(&self) -> bool {
        self.new_status.severity() > self.old_status.severity()
    }

    /// Transition time (the triggering sample's ingestion time).
    pub fn at(&self) -> Timestamp {
        self.sample.timestamp
    }
}

/// Status state machine bookkeeping for one order.
///
/// The status itself lives on the [`Order`]; the tracker is its only writer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusTracker {
    /// When the current status was entered
    status_since: Timestamp,
    /// Evaluations applied
    evaluations: u64,
    /// Transitions applied
    transitions: u64,
}

impl StatusTracker {
    /// Tracker for an order created at `created_at`.
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            status_since: created_at,
            evaluations: 0,
            transitions: 0,
        }
    }

    /// Decide whether `evaluation` moves `order` to a new status.
    pub fn observe(
        &self,
        order: &Order,
        evaluation: &Evaluation,
        details: String,
        sample: &MetricSample,
    ) -> Option<StatusChanged> {
        if evaluation.status == order.status {
            return None;
        }

        Some(StatusChanged {
            order_id: order.id,
            old_status: order.status,
            new_status: evaluation.status,
            sample: sample.clone(),
            details,
        })
    }

    /// Record an evaluation and apply its transition, if any.
    pub fn commit(&mut self, order: &mut Order, transition: Option<&StatusChanged>) {
        self.evaluations += 1;
        if let Some(event) = transition {
            order.status = event.new_status;
            self.status_since = event.at();
            self.transitions += 1;
        }
    }

    /// When the current status was entered.
    pub fn status_since(&self) -> Timestamp {
        self.status_since
    }

    /// Evaluations applied so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Transitions applied so far.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}
