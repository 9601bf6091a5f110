//! SLA contracts.
//!
//! An order's contract is a pair of SLO targets: a minimum uptime and a
//! maximum latency. Both must hold for a sample to count as compliant.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};

/// An SLO (Service Level Objective) metric type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SloMetric {
    /// Uptime percentage, higher is better
    Uptime,
    /// Latency in milliseconds, lower is better
    Latency,
}

impl SloMetric {
    /// Unit suffix used in human-readable details.
    pub fn unit(&self) -> &'static str {
        match self {
            SloMetric::Uptime => "%",
            SloMetric::Latency => "ms",
        }
    }
}

/// The uptime/latency thresholds an order must meet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlaContract {
    /// Minimum uptime, in (0, 100]
    #[serde(rename = "sla_uptime_pct")]
    pub uptime_threshold_pct: f64,
    /// Maximum latency, strictly positive
    #[serde(rename = "sla_latency_ms")]
    pub latency_threshold_ms: u64,
}

impl SlaContract {
    /// Create a contract, rejecting thresholds outside their domain.
    pub fn new(uptime_threshold_pct: f64, latency_threshold_ms: u64) -> Result<Self> {
        if !uptime_threshold_pct.is_finite()
            || uptime_threshold_pct <= 0.0
            || uptime_threshold_pct > 100.0
        {
            return Err(Error::validation(format!(
                "uptime threshold must be in (0, 100], got {}",
                uptime_threshold_pct
            )));
        }
        if latency_threshold_ms == 0 {
            return Err(Error::validation("latency threshold must be a positive integer"));
        }

        Ok(Self {
            uptime_threshold_pct,
            latency_threshold_ms,
        })
    }

    /// Target value for a metric.
    pub fn target(&self, metric: SloMetric) -> f64 {
        match metric {
            SloMetric::Uptime => self.uptime_threshold_pct,
            SloMetric::Latency => self.latency_threshold_ms as f64,
        }
    }

    /// Check if a value meets the target for a metric.
    pub fn is_met(&self, metric: SloMetric, value: f64) -> bool {
        match metric {
            SloMetric::Uptime => value >= self.uptime_threshold_pct,
            SloMetric::Latency => value <= self.latency_threshold_ms as f64,
        }
    }

    /// Per-sample verdict: both targets must hold.
    pub fn meets(&self, uptime_pct: f64, latency_ms: f64) -> bool {
        self.is_met(SloMetric::Uptime, uptime_pct) && self.is_met(SloMetric::Latency, latency_ms)
    }
}
