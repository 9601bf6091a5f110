//! SLA compliance engine.
//!
//! Wires registry, ingestor, evaluator, status tracker, alert manager and
//! store together. Ingestion runs entirely under the order's write lock:
//! stamp, evaluate, decide transition and alert change, write the journal
//! record, then apply. If the journal write fails nothing is applied.

use crate::core::{now, Error, OrderId, OrderStatus, Result, ServiceType, Timestamp};
use crate::engine::config::EngineConfig;
use crate::engine::simulator::{MetricSimulator, SimulateRequest};
use crate::ingest::{MetricIngestor, MetricReading, MetricSample};
use crate::monitoring::{
    AlertChange, AlertManager, AlertNotification, EngineMetrics, LogNotifier, MetricsSnapshot,
    Notifier,
};
use crate::query::{OrderQueries, OrderSummary, OrderView};
use crate::registry::{Order, OrderDraft, OrderRegistry, OrderState};
use crate::sla::{SlaEvaluator, StatusChanged, StatusTracker};
use crate::store::{
    create_store, BackendType, IngestRecord, JournalRecord, OrderSnapshot, OrderStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Buffered status events per subscriber.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Engine health.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthReport {
    /// "ok" or "degraded"
    pub status: String,
    /// Report time
    pub time: Timestamp,
    /// Store backend
    pub store: BackendType,
    /// Store reachable
    pub store_healthy: bool,
    /// Registered orders
    pub orders: usize,
    /// Engine counters
    pub metrics: MetricsSnapshot,
}

/// The SLA compliance monitoring engine.
pub struct SlaEngine {
    config: EngineConfig,
    registry: Arc<OrderRegistry>,
    queries: OrderQueries,
    ingestor: MetricIngestor,
    evaluator: SlaEvaluator,
    alerts: AlertManager,
    simulator: MetricSimulator,
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<StatusChanged>,
    metrics: EngineMetrics,
}

impl SlaEngine {
    /// Create an empty engine on top of `store`.
    pub fn new(config: EngineConfig, store: Arc<dyn OrderStore>) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(OrderRegistry::new());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            queries: OrderQueries::new(registry.clone(), config.alert_view_limit),
            registry,
            ingestor: MetricIngestor::new(config.history_capacity),
            evaluator: SlaEvaluator::new(config.window_size),
            alerts: AlertManager::new(config.alert_history_limit),
            simulator: MetricSimulator::new(config.scheduler.healthy_ratio),
            store,
            notifier: Arc::new(LogNotifier),
            events,
            metrics: EngineMetrics::new(),
            config,
        })
    }

    /// Build the configured store, then restore state from it.
    pub async fn from_config(config: EngineConfig) -> Result<Self> {
        let store = create_store(&config.store).await?;
        let engine = Self::new(config, store)?;
        engine.restore().await?;
        Ok(engine)
    }

    /// Replace the notification channel.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Order registry.
    pub fn registry(&self) -> &Arc<OrderRegistry> {
        &self.registry
    }

    /// Subscribe to status transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChanged> {
        self.events.subscribe()
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // ---- Order registry ----

    /// Create a PENDING order.
    pub async fn create_order(
        &self,
        user_name: &str,
        service_type: ServiceType,
        sla_uptime_pct: f64,
        sla_latency_ms: u64,
    ) -> Result<Order> {
        let draft = OrderDraft::new(user_name, service_type, sla_uptime_pct, sla_latency_ms)?;
        let order = Order::new(
            self.registry.allocate_id(),
            &draft.user_name,
            draft.service_type,
            draft.sla,
            now(),
        );

        self.store
            .append(&JournalRecord::OrderCreated(order.clone()))
            .await
            .map_err(into_storage_failure)?;
        self.registry.insert(self.new_state(order.clone())).await?;
        self.metrics.orders_created.inc();

        info!(
            order_id = %order.id,
            user = %order.user_name,
            service = %order.service_type,
            uptime_threshold = order.sla.uptime_threshold_pct,
            latency_threshold = order.sla.latency_threshold_ms,
            "order created"
        );
        Ok(order)
    }

    /// Snapshot of one order.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.registry.get(id).await
    }

    /// Current status of an order.
    pub async fn status(&self, id: OrderId) -> Result<OrderStatus> {
        Ok(self.registry.get(id).await?.status)
    }

    /// All orders, newest first.
    pub async fn list_orders(&self) -> Vec<Order> {
        self.registry.list().await
    }

    // ---- Query surface ----

    /// Order with its recent metrics and alerts.
    pub async fn order_view(&self, id: OrderId) -> Result<OrderView> {
        self.queries.order_view(id).await
    }

    /// Order list rows, newest first.
    pub async fn order_summaries(&self) -> Vec<OrderSummary> {
        self.queries.list_orders().await
    }

    // ---- Ingestion ----

    /// Ingest one sample and evaluate it before returning.
    pub async fn ingest(&self, order_id: OrderId, uptime_pct: f64, latency_ms: f64) -> Result<MetricSample> {
        let reading = match MetricReading::new(uptime_pct, latency_ms) {
            Ok(reading) => reading,
            Err(e) => {
                self.metrics.ingest_failures.inc();
                debug!(order_id = %order_id, error = %e, "rejected reading");
                return Err(e);
            }
        };
        self.ingest_reading(order_id, reading).await
    }

    /// Ingest an already validated reading.
    pub async fn ingest_reading(&self, order_id: OrderId, reading: MetricReading) -> Result<MetricSample> {
        let result = self.apply_reading(order_id, reading).await;
        if let Err(e) = &result {
            self.metrics.ingest_failures.inc();
            if e.is_client_error() {
                debug!(order_id = %order_id, error = %e, "ingestion rejected");
            } else if e.is_retryable() {
                warn!(order_id = %order_id, error = %e, "ingestion failed, retry later");
            } else {
                error!(order_id = %order_id, error = %e, "ingestion failed");
            }
        }
        result
    }

    /// Ingest simulated readings for an order.
    pub async fn simulate(&self, order_id: OrderId, request: &SimulateRequest) -> Result<Vec<MetricSample>> {
        let order = self.registry.get(order_id).await?;
        let readings = self.simulator.readings(&order.sla, request)?;

        let mut samples = Vec::with_capacity(readings.len());
        for reading in readings {
            samples.push(self.ingest_reading(order_id, reading).await?);
        }
        Ok(samples)
    }

    async fn apply_reading(&self, order_id: OrderId, reading: MetricReading) -> Result<MetricSample> {
        let cell = self.registry.cell(order_id).await?;
        let mut state = cell.write().await;

        let sample = self.ingestor.stamp(order_id, &state.history, reading);
        let window = self
            .ingestor
            .candidate_window(&state.history, &sample, self.evaluator.window_size());
        let evaluation = self.evaluator.evaluate(&state.order.sla, &window);
        let details = evaluation.details(&state.order.sla);
        let transition = state
            .tracker
            .observe(&state.order, &evaluation, details, &sample);

        let alert = match &transition {
            Some(event) => self
                .alerts
                .on_status_changed(&state.alerts, event)
                .map_err(|e| Error::StorageFailure(format!("alert delivery failed: {}", e)))?,
            None => None,
        };

        let record = IngestRecord {
            sample: sample.clone(),
            status: evaluation.status,
            transition: transition.clone(),
            alert: alert.clone(),
        };
        self.store
            .append(&JournalRecord::SampleIngested(record))
            .await
            .map_err(into_storage_failure)?;

        let OrderState {
            order,
            history,
            tracker,
            alerts,
        } = &mut *state;
        history.push(sample.clone());
        tracker.commit(order, transition.as_ref());
        if let Some(change) = &alert {
            alerts.apply(change);
        }
        self.metrics.samples_ingested.inc();

        if let Some(event) = transition {
            self.metrics.status_changes.inc();
            info!(
                order_id = %order_id,
                old = %event.old_status,
                new = %event.new_status,
                seq = event.sample.seq,
                "status changed: {}",
                event.details
            );
            // No subscribers is fine.
            let _ = self.events.send(event);
        }

        let notification = alert.map(|change| {
            self.record_alert_change(&change);
            AlertNotification::from_change(&change, &order.user_name, order.service_type, order.status)
        });
        drop(state);

        if let Some(notification) = notification {
            if let Err(e) = self.notifier.notify(&notification).await {
                warn!(
                    order_id = %order_id,
                    channel = self.notifier.name(),
                    error = %e,
                    "alert notification failed"
                );
            }
        }

        Ok(sample)
    }

    fn record_alert_change(&self, change: &AlertChange) {
        let alert = change.alert();
        match change {
            AlertChange::Opened(_) => self.metrics.alerts_opened.inc(),
            AlertChange::Closed(_) => self.metrics.alerts_closed.inc(),
            AlertChange::Escalated(_) | AlertChange::Updated(_) => {}
        }
        info!(
            order_id = %alert.order_id,
            alert_id = %alert.id,
            severity = ?alert.severity,
            "alert {}",
            change.kind()
        );
    }

    // ---- Recovery ----

    /// Rebuild state from the store's journal. Returns records replayed.
    pub async fn restore(&self) -> Result<usize> {
        if !self.registry.is_empty().await {
            return Err(Error::Internal("restore requires an empty engine".to_string()));
        }

        let records = self.store.load().await.map_err(into_storage_failure)?;
        for record in &records {
            match record {
                JournalRecord::OrderCreated(order) => {
                    self.registry.insert(self.new_state(order.clone())).await?;
                }
                JournalRecord::SampleIngested(ingested) => {
                    let cell = self.registry.cell(ingested.sample.order_id).await.map_err(|_| {
                        Error::StorageFailure(format!(
                            "journal references unknown order {}",
                            ingested.sample.order_id
                        ))
                    })?;
                    let mut state = cell.write().await;
                    let OrderState {
                        order,
                        history,
                        tracker,
                        alerts,
                    } = &mut *state;
                    history.push(ingested.sample.clone());
                    tracker.commit(order, ingested.transition.as_ref());
                    order.status = ingested.status;
                    if let Some(change) = &ingested.alert {
                        alerts.apply(change);
                    }
                }
                JournalRecord::OrderSnapshot(snapshot) => {
                    self.registry.insert(self.state_from_snapshot(snapshot)).await?;
                }
            }
        }

        let orders = self.registry.len().await;
        if !records.is_empty() {
            info!(
                records = records.len(),
                orders,
                store = %self.store.backend_type(),
                "state restored from journal"
            );
        }
        if self.config.store.compact_on_restore && records.len() > orders {
            if let Err(e) = self.compact().await {
                warn!(error = %e, "journal compaction failed; keeping full journal");
            }
        }
        Ok(records.len())
    }

    /// Rewrite the journal as one snapshot per order.
    pub async fn compact(&self) -> Result<usize> {
        let mut snapshots = Vec::new();
        for id in self.registry.ids().await {
            let cell = self.registry.cell(id).await?;
            let state = cell.read().await;
            snapshots.push(JournalRecord::OrderSnapshot(snapshot_of(&state)));
        }
        self.store.compact(&snapshots).await?;
        Ok(snapshots.len())
    }

    fn state_from_snapshot(&self, snapshot: &OrderSnapshot) -> OrderState {
        let mut history = self.ingestor.new_history();
        for sample in &snapshot.samples {
            history.push(sample.clone());
        }
        OrderState {
            order: snapshot.order.clone(),
            history,
            tracker: snapshot.tracker.clone(),
            alerts: self.alerts.restore_log(
                snapshot.order.id,
                snapshot.open_alert.clone(),
                snapshot.closed_alerts.clone(),
            ),
        }
    }

    // ---- Health ----

    /// Engine and store health.
    pub async fn health(&self) -> HealthReport {
        let store_healthy = match self.store.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(error = %e, "store health check failed");
                false
            }
        };

        HealthReport {
            status: if store_healthy { "ok" } else { "degraded" }.to_string(),
            time: now(),
            store: self.store.backend_type(),
            store_healthy,
            orders: self.registry.len().await,
            metrics: self.metrics.snapshot(),
        }
    }

    fn new_state(&self, order: Order) -> OrderState {
        OrderState {
            history: self.ingestor.new_history(),
            tracker: StatusTracker::new(order.created_at),
            alerts: self.alerts.new_log(order.id),
            order,
        }
    }
}

fn snapshot_of(state: &OrderState) -> OrderSnapshot {
    OrderSnapshot {
        order: state.order.clone(),
        tracker: state.tracker.clone(),
        samples: state.history.iter().cloned().collect(),
        open_alert: state.alerts.open_alert().cloned(),
        closed_alerts: state.alerts.closed().rev().cloned().collect(),
    }
}

fn into_storage_failure(err: Error) -> Error {
    match err {
        Error::StorageFailure(_) => err,
        other => Error::StorageFailure(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::{AlertSeverity, MemoryNotifier, NotificationKind};
    use crate::store::{MemoryStore, StoreConfig};

    fn engine() -> SlaEngine {
        SlaEngine::new(EngineConfig::default(), Arc::new(MemoryStore::new())).unwrap()
    }

    async fn order(engine: &SlaEngine) -> OrderId {
        engine
            .create_order("alice", ServiceType::Api, 99.0, 500)
            .await
            .unwrap()
            .id
    }

    async fn feed(engine: &SlaEngine, id: OrderId, samples: &[(f64, f64)]) {
        for (uptime, latency) in samples {
            engine.ingest(id, *uptime, *latency).await.unwrap();
        }
    }

    const BREACH: [(f64, f64); 3] = [(95.0, 600.0), (94.0, 650.0), (93.0, 700.0)];

    #[tokio::test]
    async fn test_create_order_validation() {
        let engine = engine();
        assert!(matches!(
            engine.create_order("alice", ServiceType::Api, 0.0, 500).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            engine.create_order("alice", ServiceType::Api, 99.0, 0).await,
            Err(Error::Validation(_))
        ));
        assert!(engine.list_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let engine = engine();
        let first = order(&engine).await;
        let second = order(&engine).await;
        let ids: Vec<OrderId> = engine.list_orders().await.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn test_pending_until_window_full() {
        let engine = engine();
        let id = order(&engine).await;
        assert_eq!(engine.status(id).await.unwrap(), OrderStatus::Pending);

        feed(&engine, id, &[(99.9, 100.0), (99.9, 100.0)]).await;
        assert_eq!(engine.status(id).await.unwrap(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_scenario_a_all_compliant() {
        let engine = engine();
        let id = order(&engine).await;
        feed(&engine, id, &[(99.9, 100.0), (99.8, 120.0), (99.95, 90.0)]).await;

        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Ok);
        assert!(view.alerts.is_empty());
        assert_eq!(view.metrics.len(), 3);
    }

    #[tokio::test]
    async fn test_scenarios_b_c_d() {
        let engine = engine();
        let id = order(&engine).await;

        // B: breach opens one alert on the third sample
        feed(&engine, id, &BREACH[..2]).await;
        assert!(engine.order_view(id).await.unwrap().alerts.is_empty());
        feed(&engine, id, &BREACH[2..]).await;

        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Breached);
        assert_eq!(view.alerts.len(), 1);
        let alert_id = view.alerts[0].id.clone();
        assert_eq!(view.alerts[0].severity, AlertSeverity::Critical);
        assert!(view.alerts[0].closed_at.is_none());
        assert!(view.alerts[0]
            .details
            .contains("latency 700ms exceeds threshold 500ms for 3 consecutive samples"));

        // C: one compliant sample makes the window mixed
        feed(&engine, id, &[(99.9, 100.0)]).await;
        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Degraded);
        assert_eq!(view.alerts.len(), 1);
        assert_eq!(view.alerts[0].id, alert_id);
        assert!(view.alerts[0].closed_at.is_none());
        assert_eq!(view.alerts[0].severity, AlertSeverity::Critical);
        assert!(view.alerts[0].details.contains("in 2 of 3 samples"));

        // D: two more compliant samples close the alert
        feed(&engine, id, &[(99.9, 100.0)]).await;
        assert_eq!(engine.status(id).await.unwrap(), OrderStatus::Degraded);
        assert!(engine.order_view(id).await.unwrap().alerts[0].closed_at.is_none());

        feed(&engine, id, &[(99.9, 100.0)]).await;
        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Ok);
        assert_eq!(view.alerts.len(), 1);
        assert_eq!(view.alerts[0].id, alert_id);
        assert!(view.alerts[0].closed_at.is_some());

        let metrics = engine.metrics();
        assert_eq!(metrics.alerts_opened, 1);
        assert_eq!(metrics.alerts_closed, 1);
        assert_eq!(metrics.status_changes, 3);
    }

    #[tokio::test]
    async fn test_stable_breach_is_idempotent() {
        let engine = engine();
        let id = order(&engine).await;
        let mut events = engine.subscribe();

        feed(&engine, id, &BREACH).await;
        for _ in 0..10 {
            feed(&engine, id, &[(93.0, 700.0)]).await;
        }

        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.alerts.len(), 1);
        assert_eq!(engine.metrics().status_changes, 1);

        let event = events.try_recv().unwrap();
        assert_eq!(event.new_status, OrderStatus::Breached);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_escalation_keeps_single_alert() {
        let engine = engine();
        let id = order(&engine).await;

        feed(&engine, id, &[(99.9, 100.0), (99.9, 100.0), (99.9, 100.0)]).await;
        feed(&engine, id, &[(95.0, 600.0)]).await;
        assert_eq!(engine.status(id).await.unwrap(), OrderStatus::Degraded);
        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.alerts.len(), 1);
        assert_eq!(view.alerts[0].severity, AlertSeverity::Warning);

        feed(&engine, id, &[(95.0, 600.0), (95.0, 600.0)]).await;
        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Breached);
        assert_eq!(view.alerts.len(), 1);
        assert_eq!(view.alerts[0].severity, AlertSeverity::Critical);
    }

    #[tokio::test]
    async fn test_open_alert_invariant() {
        let engine = engine();
        let id = order(&engine).await;
        let pattern = [
            (95.0, 600.0),
            (99.9, 100.0),
            (95.0, 600.0),
            (95.0, 600.0),
            (95.0, 600.0),
            (99.9, 100.0),
            (99.9, 100.0),
            (99.9, 100.0),
            (95.0, 600.0),
        ];

        for _ in 0..5 {
            for (uptime, latency) in pattern {
                engine.ingest(id, uptime, latency).await.unwrap();
                let view = engine.order_view(id).await.unwrap();
                let open = view.alerts.iter().filter(|a| a.closed_at.is_none()).count();
                assert!(open <= 1);
                assert_eq!(open == 1, view.order.status.is_violating());
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_order_not_found() {
        let engine = engine();
        let err = engine.ingest(OrderId(404), 99.0, 100.0).await.unwrap_err();
        assert!(matches!(err, Error::OrderNotFound(OrderId(404))));
        assert!(engine.list_orders().await.is_empty());
        assert_eq!(engine.metrics().samples_ingested, 0);

        let err = engine
            .simulate(OrderId(404), &SimulateRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_reading_rejected() {
        let engine = engine();
        let id = order(&engine).await;
        assert!(matches!(engine.ingest(id, 101.0, 10.0).await, Err(Error::Validation(_))));
        assert!(matches!(engine.ingest(id, 99.0, -5.0).await, Err(Error::Validation(_))));
        assert!(engine.order_view(id).await.unwrap().metrics.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_all_or_nothing() {
        let store = Arc::new(MemoryStore::new());
        let engine = SlaEngine::new(EngineConfig::default(), store.clone()).unwrap();
        let id = order(&engine).await;
        feed(&engine, id, &BREACH[..2]).await;

        store.set_available(false);
        let err = engine.ingest(id, 93.0, 700.0).await.unwrap_err();
        assert!(matches!(err, Error::StorageFailure(_)));

        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Pending);
        assert_eq!(view.metrics.len(), 2);
        assert!(view.alerts.is_empty());
        assert!(!engine.health().await.store_healthy);

        store.set_available(true);
        feed(&engine, id, &BREACH[2..]).await;
        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Breached);
        assert_eq!(view.alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_create_order_storage_failure() {
        let store = Arc::new(MemoryStore::new());
        let engine = SlaEngine::new(EngineConfig::default(), store.clone()).unwrap();
        store.set_available(false);

        let err = engine
            .create_order("alice", ServiceType::Compute, 99.0, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageFailure(_)));
        assert!(engine.list_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_history_bounded() {
        let config = EngineConfig::default().with_history_capacity(5);
        let engine = SlaEngine::new(config, Arc::new(MemoryStore::new())).unwrap();
        let id = order(&engine).await;

        for i in 0..12 {
            engine.ingest(id, 99.9, 100.0 + i as f64).await.unwrap();
        }

        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.metrics.len(), 5);
        assert_eq!(view.metrics.last().unwrap().latency_ms, 111.0);
        assert_eq!(view.metrics[0].latency_ms, 107.0);
    }

    #[tokio::test]
    async fn test_custom_window_size() {
        let config = EngineConfig::default().with_window_size(5);
        let engine = SlaEngine::new(config, Arc::new(MemoryStore::new())).unwrap();
        let id = order(&engine).await;

        feed(&engine, id, &BREACH).await;
        assert_eq!(engine.status(id).await.unwrap(), OrderStatus::Pending);
        feed(&engine, id, &BREACH[..2]).await;
        assert_eq!(engine.status(id).await.unwrap(), OrderStatus::Breached);
    }

    #[tokio::test]
    async fn test_interleaving_does_not_change_outcome() {
        let engine = Arc::new(engine());
        let a = order(&engine).await;
        let b = order(&engine).await;
        let seq_a = vec![(95.0, 600.0), (99.9, 100.0), (93.0, 700.0), (94.0, 650.0)];
        let seq_b = vec![(99.9, 100.0), (99.8, 120.0), (99.95, 90.0), (95.0, 600.0)];

        let task_a = {
            let engine = engine.clone();
            let seq = seq_a.clone();
            tokio::spawn(async move {
                for (u, l) in seq {
                    engine.ingest(a, u, l).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };
        let task_b = {
            let engine = engine.clone();
            let seq = seq_b.clone();
            tokio::spawn(async move {
                for (u, l) in seq {
                    engine.ingest(b, u, l).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };
        task_a.await.unwrap();
        task_b.await.unwrap();

        let sequential = self::engine();
        let sa = order(&sequential).await;
        let sb = order(&sequential).await;
        feed(&sequential, sa, &seq_a).await;
        feed(&sequential, sb, &seq_b).await;

        assert_eq!(
            engine.status(a).await.unwrap(),
            sequential.status(sa).await.unwrap()
        );
        assert_eq!(
            engine.status(b).await.unwrap(),
            sequential.status(sb).await.unwrap()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_order_serialized() {
        let engine = Arc::new(engine());
        let id = order(&engine).await;

        let mut tasks = Vec::new();
        for i in 0..50 {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                engine.ingest(id, 99.9, i as f64).await.unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let cell = engine.registry().cell(id).await.unwrap();
        let state = cell.read().await;
        let seqs: Vec<u64> = state.history.iter().map(|s| s.seq).collect();
        assert_eq!(seqs, (1..=50).collect::<Vec<u64>>());
        assert!(state
            .history
            .iter()
            .zip(state.history.iter().skip(1))
            .all(|(a, b)| a.timestamp <= b.timestamp));
        assert_eq!(state.order.status, OrderStatus::Ok);
    }

    #[tokio::test]
    async fn test_notifications_follow_alerts() {
        let notifier = Arc::new(MemoryNotifier::new());
        let engine = engine().with_notifier(notifier.clone());
        let id = order(&engine).await;

        feed(&engine, id, &BREACH).await;
        feed(&engine, id, &[(99.9, 100.0), (99.9, 100.0), (99.9, 100.0)]).await;

        let kinds: Vec<NotificationKind> = notifier.sent().iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::Opened,
                NotificationKind::Updated,
                NotificationKind::Resolved
            ]
        );
    }

    struct FailingNotifier;

    #[async_trait::async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _notification: &AlertNotification) -> Result<()> {
            Err(Error::Internal("mail relay down".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_ingestion() {
        let engine = engine().with_notifier(Arc::new(FailingNotifier));
        let id = order(&engine).await;

        for (uptime, latency) in BREACH {
            assert!(engine.ingest(id, uptime, latency).await.is_ok());
        }

        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Breached);
        assert_eq!(view.alerts.len(), 1);
        assert!(view.alerts[0].closed_at.is_none());
        assert_eq!(engine.metrics().alerts_opened, 1);
        assert_eq!(engine.metrics().ingest_failures, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_views_consistent_during_ingest() {
        let engine = Arc::new(engine());
        let id = order(&engine).await;
        let pattern = [
            (95.0, 600.0),
            (99.9, 100.0),
            (95.0, 600.0),
            (95.0, 600.0),
            (99.9, 100.0),
            (99.9, 100.0),
            (99.9, 100.0),
        ];

        let writer = {
            let engine = engine.clone();
            tokio::spawn(async move {
                for _ in 0..25 {
                    for (uptime, latency) in pattern {
                        engine.ingest(id, uptime, latency).await.unwrap();
                    }
                }
            })
        };

        let evaluator = SlaEvaluator::new(engine.config().window_size);
        let mut views = 0;
        while !writer.is_finished() {
            let view = engine.order_view(id).await.unwrap();
            let skip = view.metrics.len().saturating_sub(evaluator.window_size());
            let tail: Vec<MetricSample> = view.metrics[skip..]
                .iter()
                .map(|point| MetricSample {
                    order_id: id,
                    seq: 0,
                    timestamp: point.timestamp,
                    uptime_pct: point.uptime_pct,
                    latency_ms: point.latency_ms,
                })
                .collect();
            assert_eq!(
                view.order.status,
                evaluator.evaluate(&view.order.sla, &tail).status
            );

            let open = view.alerts.iter().filter(|a| a.closed_at.is_none()).count();
            assert!(open <= 1);
            assert_eq!(open == 1, view.order.status.is_violating());
            views += 1;
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert!(views > 0);
    }

    #[tokio::test]
    async fn test_simulate_fixed() {
        let engine = engine();
        let id = order(&engine).await;
        let samples = engine
            .simulate(id, &SimulateRequest::fixed(93.0, 700.0).with_count(3))
            .await
            .unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(engine.status(id).await.unwrap(), OrderStatus::Breached);
    }

    #[tokio::test]
    async fn test_restore_from_journal() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default()
            .with_store(StoreConfig::journal(dir.path().join("journal.jsonl")));

        let (id, alert_id) = {
            let engine = SlaEngine::from_config(config.clone()).await.unwrap();
            let id = order(&engine).await;
            feed(&engine, id, &BREACH).await;
            feed(&engine, id, &[(99.9, 100.0)]).await;
            let view = engine.order_view(id).await.unwrap();
            (id, view.alerts[0].id.clone())
        };

        let engine = SlaEngine::from_config(config).await.unwrap();
        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Degraded);
        assert_eq!(view.metrics.len(), 4);
        assert_eq!(view.alerts.len(), 1);
        assert_eq!(view.alerts[0].id, alert_id);

        // Sequence and ids continue after the replayed state
        let sample = engine.ingest(id, 99.9, 100.0).await.unwrap();
        assert_eq!(sample.seq, 5);
        let next = order(&engine).await;
        assert!(next > id);

        engine.ingest(id, 99.9, 100.0).await.unwrap();
        let view = engine.order_view(id).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Ok);
        assert!(view.alerts[0].closed_at.is_some());
    }

    #[tokio::test]
    async fn test_restore_compacts_journal() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default()
            .with_history_capacity(5)
            .with_store(StoreConfig::journal(dir.path().join("journal.jsonl")));
        let healthy = [(99.9, 100.0); 3];

        let (a, b, before) = {
            let engine = SlaEngine::from_config(config.clone()).await.unwrap();
            let a = order(&engine).await;
            let b = order(&engine).await;
            feed(&engine, a, &BREACH).await;
            feed(&engine, a, &healthy).await;
            feed(&engine, a, &BREACH).await;
            feed(&engine, b, &healthy).await;
            assert_eq!(engine.store.count().await.unwrap(), 14);
            (a, b, engine.order_view(a).await.unwrap())
        };
        assert_eq!(before.alerts.len(), 2);

        let engine = SlaEngine::from_config(config.clone()).await.unwrap();
        assert_eq!(engine.store.count().await.unwrap(), 2);
        assert_eq!(engine.order_view(a).await.unwrap(), before);
        assert_eq!(engine.status(b).await.unwrap(), OrderStatus::Ok);

        let sample = engine.ingest(a, 99.9, 100.0).await.unwrap();
        assert_eq!(sample.seq, 10);
        let view = engine.order_view(a).await.unwrap();
        assert_eq!(view.order.status, OrderStatus::Degraded);
        drop(engine);

        // Snapshot plus one appended sample replays to the same state
        let engine = SlaEngine::from_config(config).await.unwrap();
        assert_eq!(engine.order_view(a).await.unwrap(), view);
        assert_eq!(engine.store.count().await.unwrap(), 2);
        assert!(order(&engine).await > b);
    }

    #[tokio::test]
    async fn test_restore_without_compaction() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = StoreConfig::journal(dir.path().join("journal.jsonl"));
        store.compact_on_restore = false;
        let config = EngineConfig::default().with_store(store);

        {
            let engine = SlaEngine::from_config(config.clone()).await.unwrap();
            let id = order(&engine).await;
            feed(&engine, id, &BREACH).await;
        }

        let engine = SlaEngine::from_config(config).await.unwrap();
        assert_eq!(engine.store.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_restore_requires_empty_engine() {
        let engine = engine();
        order(&engine).await;
        assert!(matches!(engine.restore().await, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn test_health() {
        let engine = engine();
        order(&engine).await;
        let health = engine.health().await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.store, BackendType::Memory);
        assert_eq!(health.orders, 1);
        assert_eq!(health.metrics.orders_created, 1);
    }
}
