//! Metric ingestion.
//!
//! Turns validated readings into samples with server-side ordering
//! information. Appending and evaluating happen in the engine under the
//! order's lock; this type only decides what the new sample looks like.

use crate::core::{now, OrderId};
use crate::ingest::history::MetricHistory;
use crate::ingest::sample::{MetricReading, MetricSample};

/// Builds samples and candidate evaluation windows.
#[derive(Clone, Debug)]
pub struct MetricIngestor {
    history_capacity: usize,
}

impl MetricIngestor {
    /// Create an ingestor retaining `history_capacity` samples per order.
    pub fn new(history_capacity: usize) -> Self {
        Self { history_capacity }
    }

    /// Empty history sized for this ingestor.
    pub fn new_history(&self) -> MetricHistory {
        MetricHistory::new(self.history_capacity)
    }

    /// Stamp a reading as the next sample of `history`.
    ///
    /// Timestamps never go backwards within an order even if the wall clock
    /// does.
    pub fn stamp(
        &self,
        order_id: OrderId,
        history: &MetricHistory,
        reading: MetricReading,
    ) -> MetricSample {
        let (seq, timestamp) = match history.latest() {
            Some(last) => (last.seq + 1, now().max(last.timestamp)),
            None => (1, now()),
        };

        MetricSample {
            order_id,
            seq,
            timestamp,
            uptime_pct: reading.uptime_pct,
            latency_ms: reading.latency_ms,
        }
    }

    /// The window the evaluator would see once `sample` is appended.
    pub fn candidate_window(
        &self,
        history: &MetricHistory,
        sample: &MetricSample,
        window_size: usize,
    ) -> Vec<MetricSample> {
        let mut window = history.tail(window_size.saturating_sub(1));
        window.push(sample.clone());
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(latency: f64) -> MetricReading {
        MetricReading::new(99.9, latency).unwrap()
    }

    #[test]
    fn test_stamp_sequence() {
        let ingestor = MetricIngestor::new(10);
        let mut history = ingestor.new_history();

        let first = ingestor.stamp(OrderId(4), &history, reading(1.0));
        assert_eq!(first.seq, 1);
        history.push(first.clone());

        let second = ingestor.stamp(OrderId(4), &history, reading(2.0));
        assert_eq!(second.seq, 2);
        assert!(second.timestamp >= first.timestamp);
        assert_eq!(second.order_id, OrderId(4));
    }

    #[test]
    fn test_stamp_monotonic_against_future_sample() {
        let ingestor = MetricIngestor::new(10);
        let mut history = ingestor.new_history();
        let future = now() + chrono::Duration::hours(1);
        history.push(MetricSample {
            order_id: OrderId(1),
            seq: 1,
            timestamp: future,
            uptime_pct: 99.0,
            latency_ms: 1.0,
        });

        let next = ingestor.stamp(OrderId(1), &history, reading(1.0));
        assert_eq!(next.timestamp, future);
    }

    #[test]
    fn test_candidate_window() {
        let ingestor = MetricIngestor::new(10);
        let mut history = ingestor.new_history();
        for latency in [1.0, 2.0, 3.0, 4.0] {
            let sample = ingestor.stamp(OrderId(1), &history, reading(latency));
            history.push(sample);
        }

        let next = ingestor.stamp(OrderId(1), &history, reading(5.0));
        let window = ingestor.candidate_window(&history, &next, 3);
        let latencies: Vec<f64> = window.iter().map(|s| s.latency_ms).collect();
        assert_eq!(latencies, vec![3.0, 4.0, 5.0]);
        assert_eq!(history.len(), 4);
    }
}
