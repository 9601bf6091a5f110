//! Ingest Module
//!
//! Accepts metric samples for orders:
//! - Range validation of readings
//! - Server-assigned ordering (sequence + monotonic timestamp)
//! - Bounded per-order history

pub mod history;
pub mod ingestor;
pub mod sample;

pub use history::MetricHistory;
pub use ingestor::MetricIngestor;
pub use sample::{MetricReading, MetricSample};
