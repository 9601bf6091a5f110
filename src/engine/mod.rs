//! Engine Module
//!
//! Ties the SLA components into one service:
//! - Configuration
//! - Ingestion pipeline and journal recovery
//! - Metric simulation and background scheduling

pub mod config;
pub mod scheduler;
pub mod service;
pub mod simulator;

pub use config::{EngineConfig, SchedulerConfig};
pub use scheduler::{MetricScheduler, SchedulerHandle, TickReport};
pub use service::{HealthReport, SlaEngine};
pub use simulator::{MetricSimulator, SimulateRequest, MAX_SIMULATE_COUNT};
