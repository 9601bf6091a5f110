//! Read-only query surface.
//!
//! Each view is built under the order's read lock, so a reader sees the
//! order either before or after a concurrent ingestion, never a mix.

use crate::core::{OrderId, Result};
use crate::query::view::{OrderSummary, OrderView};
use crate::registry::OrderRegistry;
use std::sync::Arc;

/// Composes registry, history and alerts for readers.
#[derive(Clone)]
pub struct OrderQueries {
    registry: Arc<OrderRegistry>,
    alert_view_limit: usize,
}

impl OrderQueries {
    /// Create a query surface over `registry`.
    pub fn new(registry: Arc<OrderRegistry>, alert_view_limit: usize) -> Self {
        Self {
            registry,
            alert_view_limit,
        }
    }

    /// Snapshot view of one order.
    pub async fn order_view(&self, id: OrderId) -> Result<OrderView> {
        let cell = self.registry.cell(id).await?;
        let state = cell.read().await;
        Ok(OrderView::from_state(&state, self.alert_view_limit))
    }

    /// Summaries of all orders, newest first.
    pub async fn list_orders(&self) -> Vec<OrderSummary> {
        let mut summaries = Vec::new();
        for cell in self.registry.cells().await {
            let state = cell.read().await;
            summaries.push(OrderSummary::from_state(&state));
        }
        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        summaries
    }
}
