//! Query Module
//!
//! Read-only composition of orders, metric history and alerts.

pub mod surface;
pub mod view;

pub use surface::OrderQueries;
pub use view::{AlertView, ComplianceSummary, MetricPoint, OrderSummary, OrderView};
