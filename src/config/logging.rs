//! Logging configuration.

use super::parse::{env_or, parse_flag};
use super::ConfigError;

/// Logging configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log level filter (from LOG_LEVEL or RUST_LOG).
    pub filter: String,
    /// Service name for structured logging.
    pub service_name: String,
    /// Emit one JSON object per line instead of human-readable text.
    pub json: bool,
}

impl LoggingConfig {
    /// Load configuration from environment variables.
    ///
    /// Priority: LOG_LEVEL > RUST_LOG > default
    ///
    /// LOG_LEVEL accepts simple values: trace, debug, info, warn, error
    /// RUST_LOG accepts full tracing filter syntax: tokio_slots=debug
    /// LOG_JSON switches to the JSON formatter.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            filter: Self::resolve_log_filter()?,
            service_name: env_or("SERVICE_NAME", "tokio_slots"),
            json: parse_flag(&env_or("LOG_JSON", "0")),
        })
    }

    /// Resolve log filter from environment.
    ///
    /// Priority: LOG_LEVEL > RUST_LOG > default (info). An unknown LOG_LEVEL
    /// is an error rather than a silent fallback.
    fn resolve_log_filter() -> Result<String, ConfigError> {
        if let Some(level) = std::env::var("LOG_LEVEL").ok().filter(|l| !l.is_empty()) {
            let level = level.to_lowercase();
            return match level.as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => {
                    Ok(format!("tokio_slots={}", level))
                }
                _ => Err(ConfigError::Invalid {
                    key: "LOG_LEVEL".into(),
                    message: format!(
                        "'{}', expected one of: trace, debug, info, warn, error",
                        level
                    ),
                }),
            };
        }

        // Full tracing filter syntax
        if let Ok(filter) = std::env::var("RUST_LOG") {
            return Ok(filter);
        }

        Ok("tokio_slots=info".to_string())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tokio_slots=info".to_string(),
            service_name: "tokio_slots".to_string(),
            json: false,
        }
    }
}
