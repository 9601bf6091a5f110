//! Alert notifications.
//!
//! Delivered after an ingestion commits, so a failing channel never rolls
//! back status or alert state.

use crate::core::{OrderId, OrderStatus, Result, ServiceType, Timestamp};
use crate::monitoring::alerts::{AlertChange, AlertId, AlertSeverity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// What happened to the alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Opened,
    Escalated,
    Updated,
    Resolved,
}

/// A notification about an alert change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlertNotification {
    /// What happened
    pub kind: NotificationKind,
    /// Alert ID
    pub alert_id: AlertId,
    /// Order ID
    pub order_id: OrderId,
    /// Order owner
    pub user_name: String,
    /// Service type
    pub service_type: ServiceType,
    /// Alert severity
    pub severity: AlertSeverity,
    /// Order status after the change
    pub status: OrderStatus,
    /// Cause
    pub details: String,
    /// When the change happened
    pub timestamp: Timestamp,
}

impl AlertNotification {
    /// Build a notification for an applied alert change.
    pub fn from_change(
        change: &AlertChange,
        user_name: &str,
        service_type: ServiceType,
        status: OrderStatus,
    ) -> Self {
        let alert = change.alert();
        let kind = match change {
            AlertChange::Opened(_) => NotificationKind::Opened,
            AlertChange::Escalated(_) => NotificationKind::Escalated,
            AlertChange::Updated(_) => NotificationKind::Updated,
            AlertChange::Closed(_) => NotificationKind::Resolved,
        };
        let details = match (kind, &alert.resolution) {
            (NotificationKind::Resolved, Some(resolution)) => resolution.clone(),
            _ => alert.details.clone(),
        };

        Self {
            kind,
            alert_id: alert.id.clone(),
            order_id: alert.order_id,
            user_name: user_name.to_string(),
            service_type,
            severity: alert.severity,
            status,
            details,
            timestamp: alert.updated_at,
        }
    }

    /// Subject line.
    pub fn subject(&self) -> String {
        format!(
            "SLA alert {:?} for {} order {}",
            self.kind, self.service_type, self.order_id
        )
    }

    /// Plain-text body.
    pub fn to_text(&self) -> String {
        format!(
            "Order ID: {}\nUser: {}\nService: {}\nSeverity: {:?}\nDetails: {}\nTime: {}\nCurrent Status: {}\n",
            self.order_id,
            self.user_name,
            self.service_type,
            self.severity,
            self.details,
            self.timestamp,
            self.status
        )
    }
}

/// Delivery channel for alert notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification.
    async fn notify(&self, notification: &AlertNotification) -> Result<()>;

    /// Channel name for logs.
    fn name(&self) -> &str;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &AlertNotification) -> Result<()> {
        match notification.kind {
            NotificationKind::Resolved => tracing::info!(
                order_id = %notification.order_id,
                alert_id = %notification.alert_id,
                "{}: {}",
                notification.subject(),
                notification.details
            ),
            _ => tracing::warn!(
                order_id = %notification.order_id,
                alert_id = %notification.alert_id,
                severity = ?notification.severity,
                "{}: {}",
                notification.subject(),
                notification.details
            ),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Keeps notifications in memory, for inspection and tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<AlertNotification>>,
}

impl MemoryNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications delivered so far.
    pub fn sent(&self) -> Vec<AlertNotification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, notification: &AlertNotification) -> Result<()> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| crate::core::Error::Internal("notifier lock poisoned".to_string()))?;
        sent.push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
