//! Engine configuration.
//!
//! Defaults, JSON loading and environment overlay.

use crate::core::{Error, Result};
use crate::monitoring::{LogFormat, LoggingConfig};
use crate::store::{BackendType, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Background metric generation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the scheduler in the binary
    pub enabled: bool,
    /// Seconds between ticks
    pub interval_seconds: u64,
    /// Probability that a simulated reading meets the SLA
    pub healthy_ratio: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 8,
            healthy_ratio: 0.7,
        }
    }
}

/// SLA engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Samples per evaluation window
    pub window_size: usize,
    /// Samples retained per order
    pub history_capacity: usize,
    /// Closed alerts retained per order
    pub alert_history_limit: usize,
    /// Alerts returned by the order view
    pub alert_view_limit: usize,
    /// Durability layer
    pub store: StoreConfig,
    /// Background metric generation
    pub scheduler: SchedulerConfig,
    /// Log output
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: 3,
            history_capacity: 200,
            alert_history_limit: 50,
            alert_view_limit: 20,
            store: StoreConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the evaluation window.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the retained history depth.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set the store.
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::Config("window_size must be at least 1".to_string()));
        }
        if self.history_capacity < self.window_size {
            return Err(Error::Config(format!(
                "history_capacity ({}) must be >= window_size ({})",
                self.history_capacity, self.window_size
            )));
        }
        if self.scheduler.interval_seconds == 0 {
            return Err(Error::Config(
                "scheduler.interval_seconds must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.scheduler.healthy_ratio) {
            return Err(Error::Config(format!(
                "scheduler.healthy_ratio must be in [0, 1], got {}",
                self.scheduler.healthy_ratio
            )));
        }
        Ok(())
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with variables resolved by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "SLA_WINDOW_SIZE")? {
            config.window_size = v;
        }
        if let Some(v) = parse_var(&lookup, "SLA_HISTORY_CAPACITY")? {
            config.history_capacity = v;
        }
        if let Some(v) = parse_var(&lookup, "SLA_ALERT_HISTORY")? {
            config.alert_history_limit = v;
        }
        if let Some(path) = lookup("SLA_JOURNAL_PATH").filter(|p| !p.trim().is_empty()) {
            config.store = StoreConfig::journal(PathBuf::from(path));
        }
        if let Some(v) = parse_var(&lookup, "SCHEDULER_INTERVAL_SECONDS")? {
            config.scheduler.interval_seconds = v;
        }
        if let Some(v) = parse_var(&lookup, "SLA_SCHEDULER_ENABLED")? {
            config.scheduler.enabled = v;
        }
        if let Some(v) = parse_var::<_, LogFormat>(&lookup, "SLA_LOG_FORMAT")? {
            config.logging.format = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Whether state survives a restart.
    pub fn is_durable(&self) -> bool {
        self.store.backend != BackendType::Memory
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{}={} is not a valid value", key, raw))),
    }
}
