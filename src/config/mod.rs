//! Configuration module for tokio_slots.
//!
//! This module provides centralized configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio_slots::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Pool: {}", config.pool.name);
//! println!("Capacity: {}", config.pool.capacity());
//! ```

mod error;
mod logging;
mod parse;
mod pool;

pub use error::ConfigError;
pub use logging::LoggingConfig;
pub use pool::{PoolConfig, DEFAULT_POOL_NAME};

/// Serializes tests that read or write process environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Complete configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Pool configuration.
    pub pool: PoolConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            pool: PoolConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Pool: {}", self.pool.name);
        info!("  Capacity: {}", self.pool.capacity());
        info!("  Log filter: {}", self.logging.filter);
        if self.logging.json {
            info!("  Log format: json");
        }
    }
}
