//! Read models returned to API consumers.

use crate::core::{OrderId, OrderStatus, ServiceType, Timestamp};
use crate::ingest::{MetricHistory, MetricSample};
use crate::monitoring::{Alert, AlertSeverity};
use crate::registry::{Order, OrderState};
use crate::sla::SlaContract;
use serde::{Deserialize, Serialize};

/// One point of the metric chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: Timestamp,
    pub uptime_pct: f64,
    pub latency_ms: f64,
}

impl From<&MetricSample> for MetricPoint {
    fn from(sample: &MetricSample) -> Self {
        Self {
            timestamp: sample.timestamp,
            uptime_pct: sample.uptime_pct,
            latency_ms: sample.latency_ms,
        }
    }
}

/// Alert as shown to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertView {
    pub id: String,
    pub severity: AlertSeverity,
    pub details: String,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
    pub closed_at: Option<Timestamp>,
    pub resolution: Option<String>,
}

impl From<&Alert> for AlertView {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id.to_string(),
            severity: alert.severity,
            details: alert.details.clone(),
            opened_at: alert.opened_at,
            updated_at: alert.updated_at,
            closed_at: alert.closed_at,
            resolution: alert.resolution.clone(),
        }
    }
}

/// Compliance over the retained history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    /// Retained samples
    pub samples: usize,
    /// Samples meeting both targets
    pub compliant: usize,
    /// `compliant / samples` as a percentage; 100 with no samples
    pub compliance_pct: f64,
    /// Mean uptime
    pub avg_uptime_pct: Option<f64>,
    /// Mean latency
    pub avg_latency_ms: Option<f64>,
}

impl ComplianceSummary {
    /// Summarise `history` against `contract`.
    pub fn from_history(contract: &SlaContract, history: &MetricHistory) -> Self {
        let samples = history.len();
        if samples == 0 {
            return Self {
                samples: 0,
                compliant: 0,
                compliance_pct: 100.0,
                avg_uptime_pct: None,
                avg_latency_ms: None,
            };
        }

        let compliant = history
            .iter()
            .filter(|s| contract.meets(s.uptime_pct, s.latency_ms))
            .count();
        let n = samples as f64;

        Self {
            samples,
            compliant,
            compliance_pct: compliant as f64 / n * 100.0,
            avg_uptime_pct: Some(history.iter().map(|s| s.uptime_pct).sum::<f64>() / n),
            avg_latency_ms: Some(history.iter().map(|s| s.latency_ms).sum::<f64>() / n),
        }
    }
}

/// Detailed view of one order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    /// When the current status was entered
    pub status_since: Timestamp,
    /// Retained samples, oldest first
    pub metrics: Vec<MetricPoint>,
    /// Open alert first, then closed alerts newest first
    pub alerts: Vec<AlertView>,
    pub compliance: ComplianceSummary,
}

impl OrderView {
    /// Build from a locked order state.
    pub fn from_state(state: &OrderState, alert_limit: usize) -> Self {
        Self {
            order: state.order.clone(),
            status_since: state.tracker.status_since(),
            metrics: state.history.iter().map(MetricPoint::from).collect(),
            alerts: state
                .alerts
                .recent(alert_limit)
                .iter()
                .map(AlertView::from)
                .collect(),
            compliance: ComplianceSummary::from_history(&state.order.sla, &state.history),
        }
    }
}

/// Row of the order list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_name: String,
    pub service_type: ServiceType,
    #[serde(flatten)]
    pub sla: SlaContract,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    /// Whether an alert is currently open
    pub alert_open: bool,
}

impl OrderSummary {
    /// Build from a locked order state.
    pub fn from_state(state: &OrderState) -> Self {
        let order: &Order = &state.order;
        Self {
            id: order.id,
            user_name: order.user_name.clone(),
            service_type: order.service_type,
            sla: order.sla,
            status: order.status,
            created_at: order.created_at,
            alert_open: state.alerts.open_count() > 0,
        }
    }
}
