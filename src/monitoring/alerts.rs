//! Alert management.
//!
//! Alerts mirror status transitions: opened when an order leaves
//! compliance, escalated or updated in place while it stays out, closed
//! when it returns to OK. At most one alert per order is open at a time.

use crate::core::{Error, OrderId, OrderStatus, Result, Timestamp};
use crate::sla::StatusChanged;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Unique alert identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub String);

impl AlertId {
    /// Generate a unique ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Alert severity level, derived from order status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Order is DEGRADED
    Warning,
    /// Order is BREACHED
    Critical,
}

impl AlertSeverity {
    /// Severity for a status; healthy statuses have none.
    pub fn from_status(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Degraded => Some(AlertSeverity::Warning),
            OrderStatus::Breached => Some(AlertSeverity::Critical),
            OrderStatus::Pending | OrderStatus::Ok => None,
        }
    }
}

/// An SLA alert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert ID
    pub id: AlertId,
    /// Order the alert belongs to
    pub order_id: OrderId,
    /// Highest severity reached while open
    pub severity: AlertSeverity,
    /// When the alert opened
    pub opened_at: Timestamp,
    /// Last time details or severity changed
    pub updated_at: Timestamp,
    /// When the alert closed
    pub closed_at: Option<Timestamp>,
    /// Latest cause
    pub details: String,
    /// Set when the order recovered
    pub resolution: Option<String>,
}

impl Alert {
    /// Open a new alert from a transition.
    pub fn open(event: &StatusChanged, severity: AlertSeverity) -> Self {
        Self {
            id: AlertId::generate(),
            order_id: event.order_id,
            severity,
            opened_at: event.at(),
            updated_at: event.at(),
            closed_at: None,
            details: event.details.clone(),
            resolution: None,
        }
    }

    /// Whether the alert is still open.
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// Mutation the alert manager wants applied to an order's alert log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AlertChange {
    /// New alert opened
    Opened(Alert),
    /// Open alert raised to a higher severity
    Escalated(Alert),
    /// Open alert details refreshed
    Updated(Alert),
    /// Open alert closed
    Closed(Alert),
}

impl AlertChange {
    /// The alert after the change.
    pub fn alert(&self) -> &Alert {
        match self {
            AlertChange::Opened(a)
            | AlertChange::Escalated(a)
            | AlertChange::Updated(a)
            | AlertChange::Closed(a) => a,
        }
    }

    /// Short label for logs and notifications.
    pub fn kind(&self) -> &'static str {
        match self {
            AlertChange::Opened(_) => "opened",
            AlertChange::Escalated(_) => "escalated",
            AlertChange::Updated(_) => "updated",
            AlertChange::Closed(_) => "resolved",
        }
    }
}

/// Alert history of one order.
#[derive(Clone, Debug)]
pub struct AlertLog {
    order_id: OrderId,
    open: Option<Alert>,
    closed: VecDeque<Alert>,
    history_limit: usize,
}

impl AlertLog {
    /// Empty log retaining at most `history_limit` closed alerts.
    pub fn new(order_id: OrderId, history_limit: usize) -> Self {
        Self {
            order_id,
            open: None,
            closed: VecDeque::new(),
            history_limit,
        }
    }

    /// Order this log belongs to.
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// The open alert, if any.
    pub fn open_alert(&self) -> Option<&Alert> {
        self.open.as_ref()
    }

    /// Number of open alerts (0 or 1).
    pub fn open_count(&self) -> usize {
        usize::from(self.open.is_some())
    }

    /// Closed alerts, newest first.
    pub fn closed(&self) -> impl DoubleEndedIterator<Item = &Alert> {
        self.closed.iter().rev()
    }

    /// Open alert first, then closed alerts newest first.
    pub fn recent(&self, limit: usize) -> Vec<Alert> {
        self.open
            .iter()
            .chain(self.closed())
            .take(limit)
            .cloned()
            .collect()
    }

    /// Apply a change produced by [`AlertManager::on_status_changed`].
    pub fn apply(&mut self, change: &AlertChange) {
        match change {
            AlertChange::Opened(alert)
            | AlertChange::Escalated(alert)
            | AlertChange::Updated(alert) => {
                self.open = Some(alert.clone());
            }
            AlertChange::Closed(alert) => {
                self.open = None;
                self.closed.push_back(alert.clone());
                while self.closed.len() > self.history_limit {
                    self.closed.pop_front();
                }
            }
        }
    }
}

/// Alert manager turning status transitions into alert changes.
#[derive(Clone, Debug)]
pub struct AlertManager {
    history_limit: usize,
}

impl AlertManager {
    /// Create a manager retaining `history_limit` closed alerts per order.
    pub fn new(history_limit: usize) -> Self {
        Self { history_limit }
    }

    /// Empty alert log for a new order.
    pub fn new_log(&self, order_id: OrderId) -> AlertLog {
        AlertLog::new(order_id, self.history_limit)
    }

    /// Rebuild a log from retained alerts, closed ones oldest first.
    pub fn restore_log(&self, order_id: OrderId, open: Option<Alert>, closed: Vec<Alert>) -> AlertLog {
        let mut log = self.new_log(order_id);
        let skip = closed.len().saturating_sub(self.history_limit);
        log.closed = closed.into_iter().skip(skip).collect();
        log.open = open;
        log
    }

    /// Decide the alert change for a transition.
    ///
    /// Does not mutate `log`; the caller applies the change once it is
    /// durable.
    pub fn on_status_changed(
        &self,
        log: &AlertLog,
        event: &StatusChanged,
    ) -> Result<Option<AlertChange>> {
        if log.order_id != event.order_id {
            return Err(Error::OrderNotFound(event.order_id));
        }

        let change = match (AlertSeverity::from_status(event.new_status), &log.open) {
            (Some(severity), None) => Some(AlertChange::Opened(Alert::open(event, severity))),
            (Some(severity), Some(open)) => {
                let mut alert = open.clone();
                alert.details = event.details.clone();
                alert.updated_at = event.at();
                if severity > alert.severity {
                    alert.severity = severity;
                    Some(AlertChange::Escalated(alert))
                } else {
                    Some(AlertChange::Updated(alert))
                }
            }
            (None, Some(open)) if event.new_status == OrderStatus::Ok => {
                let mut alert = open.clone();
                alert.closed_at = Some(event.at());
                alert.updated_at = event.at();
                alert.resolution = Some(format!("service recovered within SLA: {}", event.details));
                Some(AlertChange::Closed(alert))
            }
            (None, _) => None,
        };

        Ok(change)
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(50)
    }
}
