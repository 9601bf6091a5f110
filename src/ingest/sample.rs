//! Metric samples.

use crate::core::{Error, OrderId, Result, Timestamp};
use serde::{Deserialize, Serialize};

/// A raw, not yet accepted measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    /// Uptime percentage, in [0, 100]
    pub uptime_pct: f64,
    /// Latency in milliseconds, >= 0
    pub latency_ms: f64,
}

impl MetricReading {
    /// Create a reading, rejecting out-of-range values.
    pub fn new(uptime_pct: f64, latency_ms: f64) -> Result<Self> {
        if !uptime_pct.is_finite() || !(0.0..=100.0).contains(&uptime_pct) {
            return Err(Error::validation(format!(
                "uptime_pct must be in [0, 100], got {}",
                uptime_pct
            )));
        }
        if !latency_ms.is_finite() || latency_ms < 0.0 {
            return Err(Error::validation(format!(
                "latency_ms must be >= 0, got {}",
                latency_ms
            )));
        }

        Ok(Self {
            uptime_pct,
            latency_ms,
        })
    }
}

/// An accepted sample. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Owning order
    pub order_id: OrderId,
    /// Per-order ingestion sequence, starting at 1
    pub seq: u64,
    /// Server-assigned ingestion time
    pub timestamp: Timestamp,
    /// Uptime percentage
    pub uptime_pct: f64,
    /// Latency in milliseconds
    pub latency_ms: f64,
}
