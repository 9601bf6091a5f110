//! Structured logging setup.
//!
//! Installs a `tracing` subscriber with an env-driven filter and a text or
//! JSON formatter.

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "SLA_LOG";

static INIT: Once = Once::new();

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::core::Error;

    fn from_str(s: &str) -> crate::core::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(crate::core::Error::Config(format!(
                "unknown log format '{}'",
                other
            ))),
        }
    }
}

/// Logger configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Filter used when `SLA_LOG` is unset or invalid
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            default_filter: "slamon=info".to_string(),
        }
    }
}

/// Initialize the tracing subscriber. Later calls are no-ops.
pub fn init_tracing(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

        let registry = tracing_subscriber::registry().with(filter);
        let result = match config.format {
            LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_current_span(false))
                .try_init(),
        };

        if let Err(err) = result {
            eprintln!("tracing subscriber already installed: {}", err);
        }
    });
}
