//! # slamon - SLA Compliance Monitoring
//!
//! Tracks service orders against their uptime and latency SLAs:
//! - **Registry**: orders and their SLA contracts
//! - **Ingest**: ordered, bounded per-order metric history
//! - **SLA**: window evaluation and the per-order status state machine
//! - **Monitoring**: alert lifecycle, notifications, counters, logging
//! - **Store**: append-only journal for restart recovery
//! - **API**: JSON handlers for orders, queries and simulation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slamon::core::ServiceType;
//! use slamon::engine::{EngineConfig, SlaEngine};
//!
//! #[tokio::main]
//! async fn main() -> slamon::Result<()> {
//!     let engine = SlaEngine::from_config(EngineConfig::default()).await?;
//!     let order = engine
//!         .create_order("alice", ServiceType::Api, 99.5, 300)
//!         .await?;
//!
//!     for _ in 0..3 {
//!         engine.ingest(order.id, 97.0, 450.0).await?;
//!     }
//!     println!("status: {}", engine.status(order.id).await?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod core;
pub mod engine;
pub mod ingest;
pub mod monitoring;
pub mod query;
pub mod registry;
pub mod sla;
pub mod store;

pub use crate::core::error::{Error, Result};
pub use crate::core::{OrderId, OrderStatus, ServiceType};
pub use api::{ApiResponse, ApiService};
pub use engine::{EngineConfig, SlaEngine};
