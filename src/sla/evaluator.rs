//! SLA evaluation.
//!
//! Pure window aggregation: no state, no mutation. A single noisy sample
//! cannot move the verdict on its own because the whole window is judged.

use crate::core::OrderStatus;
use crate::ingest::MetricSample;
use crate::sla::agreement::{SlaContract, SloMetric};
use serde::{Deserialize, Serialize};

/// Aggregate verdict over an evaluation window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Derived status
    pub status: OrderStatus,
    /// Samples considered
    pub window_len: usize,
    /// Configured window size
    pub window_size: usize,
    /// Samples meeting both targets
    pub compliant: usize,
    /// Samples below the uptime target
    pub uptime_violations: usize,
    /// Samples above the latency target
    pub latency_violations: usize,
    /// Lowest violating uptime
    pub worst_uptime: Option<f64>,
    /// Highest violating latency
    pub worst_latency: Option<f64>,
}

impl Evaluation {
    /// Human-readable cause for this verdict.
    pub fn details(&self, contract: &SlaContract) -> String {
        match self.status {
            OrderStatus::Pending => format!(
                "collecting samples ({}/{})",
                self.window_len, self.window_size
            ),
            OrderStatus::Ok => format!(
                "all {} samples within SLA (uptime >= {}%, latency <= {}ms)",
                self.window_len, contract.uptime_threshold_pct, contract.latency_threshold_ms
            ),
            OrderStatus::Degraded | OrderStatus::Breached => {
                let mut parts = Vec::new();
                if let Some(worst) = self.worst_latency {
                    let unit = SloMetric::Latency.unit();
                    parts.push(format!(
                        "latency {}{} exceeds threshold {}{} {}",
                        worst,
                        unit,
                        contract.latency_threshold_ms,
                        unit,
                        self.span(self.latency_violations)
                    ));
                }
                if let Some(worst) = self.worst_uptime {
                    let unit = SloMetric::Uptime.unit();
                    parts.push(format!(
                        "uptime {}{} below threshold {}{} {}",
                        worst,
                        unit,
                        contract.target(SloMetric::Uptime),
                        unit,
                        self.span(self.uptime_violations)
                    ));
                }
                parts.join("; ")
            }
        }
    }

    fn span(&self, violations: usize) -> String {
        if violations == self.window_len {
            format!("for {} consecutive samples", violations)
        } else {
            format!("in {} of {} samples", violations, self.window_len)
        }
    }
}

/// Window-based SLA evaluator.
#[derive(Clone, Debug)]
pub struct SlaEvaluator {
    window_size: usize,
}

impl SlaEvaluator {
    /// Create an evaluator. A zero window is treated as one.
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    /// Configured window size.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Evaluate the most recent `window_size` samples of `samples`.
    pub fn evaluate(&self, contract: &SlaContract, samples: &[MetricSample]) -> Evaluation {
        let skip = samples.len().saturating_sub(self.window_size);
        let window = &samples[skip..];

        let mut evaluation = Evaluation {
            status: OrderStatus::Pending,
            window_len: window.len(),
            window_size: self.window_size,
            compliant: 0,
            uptime_violations: 0,
            latency_violations: 0,
            worst_uptime: None,
            worst_latency: None,
        };

        for sample in window {
            let uptime_ok = contract.is_met(SloMetric::Uptime, sample.uptime_pct);
            let latency_ok = contract.is_met(SloMetric::Latency, sample.latency_ms);

            if uptime_ok && latency_ok {
                evaluation.compliant += 1;
            }
            if !uptime_ok {
                evaluation.uptime_violations += 1;
                evaluation.worst_uptime = Some(
                    evaluation
                        .worst_uptime
                        .map_or(sample.uptime_pct, |w| w.min(sample.uptime_pct)),
                );
            }
            if !latency_ok {
                evaluation.latency_violations += 1;
                evaluation.worst_latency = Some(
                    evaluation
                        .worst_latency
                        .map_or(sample.latency_ms, |w| w.max(sample.latency_ms)),
                );
            }
        }

        evaluation.status = if window.len() < self.window_size {
            OrderStatus::Pending
        } else if evaluation.compliant == window.len() {
            OrderStatus::Ok
        } else if evaluation.compliant == 0 {
            OrderStatus::Breached
        } else {
            OrderStatus::Degraded
        };

        evaluation
    }
}

impl Default for SlaEvaluator {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{now, OrderId};

    fn samples(values: &[(f64, f64)]) -> Vec<MetricSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, (uptime, latency))| MetricSample {
                order_id: OrderId(1),
                seq: i as u64 + 1,
                timestamp: now(),
                uptime_pct: *uptime,
                latency_ms: *latency,
            })
            .collect()
    }

    fn contract() -> SlaContract {
        SlaContract::new(99.0, 500).unwrap()
    }

    #[test]
    fn test_pending_until_window_full() {
        let evaluator = SlaEvaluator::new(3);
        let evaluation = evaluator.evaluate(&contract(), &samples(&[(95.0, 600.0), (94.0, 650.0)]));
        assert_eq!(evaluation.status, OrderStatus::Pending);
        assert_eq!(evaluation.details(&contract()), "collecting samples (2/3)");

        let empty = evaluator.evaluate(&contract(), &[]);
        assert_eq!(empty.status, OrderStatus::Pending);
    }

    #[test]
    fn test_all_compliant_is_ok() {
        let evaluator = SlaEvaluator::new(3);
        let evaluation = evaluator.evaluate(
            &contract(),
            &samples(&[(99.9, 100.0), (99.8, 120.0), (99.95, 90.0)]),
        );
        assert_eq!(evaluation.status, OrderStatus::Ok);
        assert_eq!(evaluation.compliant, 3);
    }

    #[test]
    fn test_none_compliant_is_breached() {
        let evaluator = SlaEvaluator::new(3);
        let evaluation = evaluator.evaluate(
            &contract(),
            &samples(&[(95.0, 600.0), (94.0, 650.0), (93.0, 700.0)]),
        );
        assert_eq!(evaluation.status, OrderStatus::Breached);
        assert_eq!(evaluation.worst_latency, Some(700.0));
        assert_eq!(evaluation.worst_uptime, Some(93.0));
        assert_eq!(
            evaluation.details(&contract()),
            "latency 700ms exceeds threshold 500ms for 3 consecutive samples; \
             uptime 93% below threshold 99% for 3 consecutive samples"
        );
    }

    #[test]
    fn test_mixed_is_degraded() {
        let evaluator = SlaEvaluator::new(3);
        let evaluation = evaluator.evaluate(
            &contract(),
            &samples(&[(94.0, 650.0), (93.0, 700.0), (99.9, 100.0)]),
        );
        assert_eq!(evaluation.status, OrderStatus::Degraded);
        assert!(evaluation
            .details(&contract())
            .starts_with("latency 700ms exceeds threshold 500ms in 2 of 3 samples"));
    }

    #[test]
    fn test_only_latest_window_counts() {
        let evaluator = SlaEvaluator::new(2);
        let evaluation = evaluator.evaluate(
            &contract(),
            &samples(&[(50.0, 9000.0), (99.9, 100.0), (99.9, 110.0)]),
        );
        assert_eq!(evaluation.status, OrderStatus::Ok);
        assert_eq!(evaluation.window_len, 2);
    }

    #[test]
    fn test_boundary_values_meet() {
        let evaluator = SlaEvaluator::new(1);
        let evaluation = evaluator.evaluate(&contract(), &samples(&[(99.0, 500.0)]));
        assert_eq!(evaluation.status, OrderStatus::Ok);
    }

    #[test]
    fn test_deterministic() {
        let evaluator = SlaEvaluator::default();
        let window = samples(&[(99.9, 100.0), (95.0, 100.0), (99.9, 800.0)]);
        assert_eq!(
            evaluator.evaluate(&contract(), &window),
            evaluator.evaluate(&contract(), &window)
        );
    }
}
