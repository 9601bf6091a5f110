//! Monitoring Module
//!
//! Provides alerting and observability for the SLA engine:
//! - Alert lifecycle (open, escalate, update, close)
//! - Alert notifications
//! - Engine counters
//! - Structured logging

pub mod alerts;
pub mod logging;
pub mod metrics;
pub mod notify;

pub use alerts::{Alert, AlertChange, AlertId, AlertLog, AlertManager, AlertSeverity};
pub use logging::{init_tracing, LogFormat, LoggingConfig};
pub use metrics::{Counter, EngineMetrics, MetricsSnapshot};
pub use notify::{AlertNotification, LogNotifier, MemoryNotifier, NotificationKind, Notifier};
