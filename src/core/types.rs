//! Common types used across the SLA monitor.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Unique, immutable order identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    /// Get the raw value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(OrderId)
            .map_err(|_| Error::validation(format!("invalid order id '{}'", s)))
    }
}

/// Kind of service an order covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// Compute capacity
    Compute,
    /// Storage capacity
    Storage,
    /// Hosted API
    Api,
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceType::Compute => write!(f, "compute"),
            ServiceType::Storage => write!(f, "storage"),
            ServiceType::Api => write!(f, "api"),
        }
    }
}

impl FromStr for ServiceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compute" => Ok(ServiceType::Compute),
            "storage" => Ok(ServiceType::Storage),
            "api" => Ok(ServiceType::Api),
            other => Err(Error::validation(format!(
                "unknown service type '{}' (expected compute, storage or api)",
                other
            ))),
        }
    }
}

/// Compliance status of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Not enough samples yet
    Pending,
    /// Every sample in the window meets the SLA
    Ok,
    /// Some samples in the window miss the SLA
    Degraded,
    /// No sample in the window meets the SLA
    Breached,
}

impl OrderStatus {
    /// Severity rank; PENDING and OK both rank as healthy.
    pub fn severity(&self) -> u8 {
        match self {
            OrderStatus::Pending | OrderStatus::Ok => 0,
            OrderStatus::Degraded => 1,
            OrderStatus::Breached => 2,
        }
    }

    /// Whether the order is currently out of compliance.
    pub fn is_violating(&self) -> bool {
        self.severity() > 0
    }

    /// Canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Ok => "OK",
            OrderStatus::Degraded => "DEGRADED",
            OrderStatus::Breached => "BREACHED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
