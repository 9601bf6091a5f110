//! Synthetic metric generation for demos and load tests.

use crate::core::{Error, Result};
use crate::ingest::MetricReading;
use crate::sla::SlaContract;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Most readings a single simulate request may produce.
pub const MAX_SIMULATE_COUNT: u32 = 100;

/// Body of a simulate request.
///
/// When either value is set the readings are deterministic; a missing
/// uptime defaults to 99.0 and a missing latency to 200.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulateRequest {
    pub uptime_pct: Option<f64>,
    pub latency_ms: Option<f64>,
    pub count: Option<u32>,
}

impl SimulateRequest {
    /// Fixed reading repeated `count` times.
    pub fn fixed(uptime_pct: f64, latency_ms: f64) -> Self {
        Self {
            uptime_pct: Some(uptime_pct),
            latency_ms: Some(latency_ms),
            count: None,
        }
    }

    /// Set the number of readings.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Validated reading count.
    pub fn count(&self) -> Result<u32> {
        match self.count.unwrap_or(1) {
            n @ 1..=MAX_SIMULATE_COUNT => Ok(n),
            n => Err(Error::validation(format!(
                "count must be between 1 and {}, got {}",
                MAX_SIMULATE_COUNT, n
            ))),
        }
    }

    /// The deterministic reading, if one was requested.
    pub fn fixed_reading(&self) -> Result<Option<MetricReading>> {
        if self.uptime_pct.is_none() && self.latency_ms.is_none() {
            return Ok(None);
        }
        MetricReading::new(
            self.uptime_pct.unwrap_or(99.0),
            self.latency_ms.unwrap_or(200.0),
        )
        .map(Some)
    }
}

/// Random reading generator.
#[derive(Clone, Debug)]
pub struct MetricSimulator {
    healthy_ratio: f64,
}

impl MetricSimulator {
    /// Create a simulator producing compliant readings with probability
    /// `healthy_ratio`.
    pub fn new(healthy_ratio: f64) -> Self {
        Self {
            healthy_ratio: healthy_ratio.clamp(0.0, 1.0),
        }
    }

    /// One random reading for `sla`.
    pub fn generate<R: Rng + ?Sized>(&self, sla: &SlaContract, rng: &mut R) -> MetricReading {
        let uptime_target = sla.uptime_threshold_pct;
        let latency_target = sla.latency_threshold_ms as f64;

        let (uptime, latency) = if rng.gen::<f64>() < self.healthy_ratio {
            (
                uniform(rng, (uptime_target + 0.2).min(100.0), 100.0),
                uniform(rng, (latency_target * 0.2).min(100.0), latency_target * 0.9),
            )
        } else {
            (
                uniform(
                    rng,
                    (uptime_target - 8.0).max(0.0),
                    (uptime_target - 1.0).max(0.0),
                ),
                uniform(rng, latency_target * 1.3, latency_target * 2.0),
            )
        };

        MetricReading {
            uptime_pct: round2(uptime).clamp(0.0, 100.0),
            latency_ms: round2(latency).max(0.0),
        }
    }

    /// Readings for a simulate request.
    pub fn readings(&self, sla: &SlaContract, request: &SimulateRequest) -> Result<Vec<MetricReading>> {
        let count = request.count()? as usize;
        if let Some(reading) = request.fixed_reading()? {
            return Ok(vec![reading; count]);
        }

        let mut rng = rand::thread_rng();
        Ok((0..count).map(|_| self.generate(sla, &mut rng)).collect())
    }
}

impl Default for MetricSimulator {
    fn default() -> Self {
        Self::new(0.7)
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> f64 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if high - low < f64::EPSILON {
        low
    } else {
        rng.gen_range(low..=high)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
