//! Pool configuration.

use std::num::NonZeroUsize;

use super::parse::{env_or, env_parse};
use super::ConfigError;

/// Default pool name, also used as the worker thread name prefix.
pub const DEFAULT_POOL_NAME: &str = "tokio_slots";

/// Pool configuration loaded from environment.
///
/// Capacity is resolved once at load time and never zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Pool name for logging and thread names.
    pub name: String,
    /// Resolved capacity (never zero).
    capacity: NonZeroUsize,
}

impl PoolConfig {
    /// Build a configuration directly. A capacity of 0 means "CPU count".
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity: resolve_capacity(capacity),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `POOL_NAME`: pool name (default `tokio_slots`)
    /// - `POOL_CAPACITY`: concurrent task limit (default `0` = CPU count)
    pub fn from_env() -> Result<Self, ConfigError> {
        let name = env_or("POOL_NAME", DEFAULT_POOL_NAME);
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "POOL_NAME".into(),
                message: "pool name cannot be empty".into(),
            });
        }

        let capacity: usize = env_parse("POOL_CAPACITY", 0)?;

        Ok(Self {
            name,
            capacity: resolve_capacity(capacity),
        })
    }

    /// Get capacity (pre-computed).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_NAME, 0)
    }
}

/// Resolve 0 to the CPU count.
fn resolve_capacity(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity)
        .or_else(|| NonZeroUsize::new(num_cpus::get()))
        .unwrap_or(NonZeroUsize::MIN)
}
