//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Observability configuration (structured logging).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Console logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log filter directive, e.g. "info" or "mongovault=debug".
    /// The `RUST_LOG` environment variable takes precedence.
    #[serde(default = "default_level")]
    pub level: String,

    /// Console output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include timestamps in log output.
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            timestamps: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
