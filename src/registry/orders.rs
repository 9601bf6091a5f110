//! Order registry.
//!
//! Every order is an independently lockable cell holding its history,
//! status bookkeeping and alerts. Ingestion takes the cell's write lock,
//! readers take its read lock; unrelated orders never contend.

use crate::core::{Error, OrderId, Result};
use crate::ingest::MetricHistory;
use crate::monitoring::AlertLog;
use crate::registry::order::Order;
use crate::sla::StatusTracker;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mutable state of one order.
#[derive(Clone, Debug)]
pub struct OrderState {
    /// Order record; only `status` changes after creation
    pub order: Order,
    /// Retained samples
    pub history: MetricHistory,
    /// Status bookkeeping
    pub tracker: StatusTracker,
    /// Alerts
    pub alerts: AlertLog,
}

/// Lock guarding one order's state.
pub type OrderCell = RwLock<OrderState>;

/// Registry of all orders.
pub struct OrderRegistry {
    orders: RwLock<HashMap<OrderId, Arc<OrderCell>>>,
    next_id: AtomicU64,
}

impl OrderRegistry {
    /// Create an empty registry; IDs start at 1.
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Reserve the next order ID.
    pub fn allocate_id(&self) -> OrderId {
        OrderId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Make sure future IDs are allocated after `id`.
    pub fn reserve_through(&self, id: OrderId) {
        self.next_id.fetch_max(id.0 + 1, Ordering::SeqCst);
    }

    /// Register a new order.
    pub async fn insert(&self, state: OrderState) -> Result<()> {
        let id = state.order.id;
        let mut orders = self.orders.write().await;
        if orders.contains_key(&id) {
            return Err(Error::Internal(format!("order {} registered twice", id)));
        }
        orders.insert(id, Arc::new(RwLock::new(state)));
        self.reserve_through(id);
        Ok(())
    }

    /// Lock cell for an order.
    pub async fn cell(&self, id: OrderId) -> Result<Arc<OrderCell>> {
        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::OrderNotFound(id))
    }

    /// Snapshot of an order.
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        let cell = self.cell(id).await?;
        let state = cell.read().await;
        Ok(state.order.clone())
    }

    /// All cells, in no particular order.
    pub async fn cells(&self) -> Vec<Arc<OrderCell>> {
        self.orders.read().await.values().cloned().collect()
    }

    /// All orders, newest first.
    pub async fn list(&self) -> Vec<Order> {
        let mut orders = Vec::new();
        for cell in self.cells().await {
            orders.push(cell.read().await.order.clone());
        }
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        orders
    }

    /// All order IDs, ascending.
    pub async fn ids(&self) -> Vec<OrderId> {
        let mut ids: Vec<OrderId> = self.orders.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Whether no order is registered.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

impl Default for OrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
