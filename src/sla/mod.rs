//! SLA Module
//!
//! Provides Service Level Agreement evaluation:
//! - SLA contracts (uptime and latency targets)
//! - Window-based evaluation
//! - Per-order status state machine

pub mod agreement;
pub mod evaluator;
pub mod tracker;

pub use agreement::{SlaContract, SloMetric};
pub use evaluator::{Evaluation, SlaEvaluator};
pub use tracker::{StatusChanged, StatusTracker};
