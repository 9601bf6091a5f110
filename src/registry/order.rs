//! Service orders.

use crate::core::{Error, OrderId, OrderStatus, Result, ServiceType, Timestamp};
use crate::sla::SlaContract;
use serde::{Deserialize, Serialize};

/// Longest accepted user name, in characters.
pub const MAX_USER_NAME_LEN: usize = 120;

/// A service order with its SLA contract.
///
/// Everything except `status` is fixed at creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: OrderId,
    /// Ordering user
    pub user_name: String,
    /// Service type
    pub service_type: ServiceType,
    /// SLA thresholds
    #[serde(flatten)]
    pub sla: SlaContract,
    /// Current compliance status
    pub status: OrderStatus,
    /// Creation time
    pub created_at: Timestamp,
}

impl Order {
    /// Create a PENDING order.
    pub fn new(
        id: OrderId,
        user_name: &str,
        service_type: ServiceType,
        sla: SlaContract,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_name: user_name.to_string(),
            service_type,
            sla,
            status: OrderStatus::Pending,
            created_at,
        }
    }
}

/// Validated input for a new order.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderDraft {
    pub user_name: String,
    pub service_type: ServiceType,
    pub sla: SlaContract,
}

impl OrderDraft {
    /// Validate raw order input.
    pub fn new(
        user_name: &str,
        service_type: ServiceType,
        sla_uptime_pct: f64,
        sla_latency_ms: u64,
    ) -> Result<Self> {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(Error::validation("user_name must not be empty"));
        }
        if user_name.chars().count() > MAX_USER_NAME_LEN {
            return Err(Error::validation(format!(
                "user_name must be at most {} characters",
                MAX_USER_NAME_LEN
            )));
        }

        Ok(Self {
            user_name: user_name.to_string(),
            service_type,
            sla: SlaContract::new(sla_uptime_pct, sla_latency_ms)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;

    #[test]
    fn test_draft_validation() {
        assert!(OrderDraft::new("alice", ServiceType::Api, 99.0, 500).is_ok());
        assert!(OrderDraft::new("  ", ServiceType::Api, 99.0, 500).is_err());
        assert!(OrderDraft::new("alice", ServiceType::Api, 0.0, 500).is_err());
        assert!(OrderDraft::new("alice", ServiceType::Api, 99.0, 0).is_err());
        assert!(OrderDraft::new(&"x".repeat(121), ServiceType::Api, 99.0, 500).is_err());
    }

    #[test]
    fn test_draft_trims_name() {
        let draft = OrderDraft::new(" alice ", ServiceType::Storage, 99.0, 500).unwrap();
        assert_eq!(draft.user_name, "alice");
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order::new(
            OrderId(9),
            "alice",
            ServiceType::Storage,
            SlaContract::new(99.5, 300).unwrap(),
            now(),
        );
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["service_type"], "storage");
        assert_eq!(json["sla_uptime_pct"], 99.5);
        assert_eq!(json["sla_latency_ms"], 300);
        assert_eq!(json["status"], "PENDING");
        assert!(json["created_at"].is_string());
    }
}
