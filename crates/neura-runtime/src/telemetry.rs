//! Logging initialisation
//!
//! `RUST_LOG` wins when set; otherwise the configured default filter applies.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log line format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            default_filter: "info".to_string(),
            format: LogFormat::Human,
            with_target: false,
        }
    }
}

impl TelemetryConfig {
    pub fn verbose() -> Self {
        TelemetryConfig {
            default_filter: "debug".to_string(),
            with_target: true,
            ..Default::default()
        }
    }

    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install the global subscriber
///
/// Returns false if one was already installed (e.g. by a test harness).
pub fn init_telemetry(config: &TelemetryConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_target(config.with_target);

    let result = match config.format {
        LogFormat::Human => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.is_ok()
}
