//! Runtime store configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Bounds of a [`DarRuntimeStore`](crate::store::DarRuntimeStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Loaded archives kept at most; the least recently accessed goes first.
    pub max_entries: usize,
    /// An archive not accessed for this long is dropped.
    pub time_to_idle: Duration,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::InvalidConfig("max_entries must be positive".to_string()));
        }
        if self.time_to_idle.is_zero() {
            return Err(Error::InvalidConfig("time_to_idle must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            time_to_idle: Duration::from_secs(30 * 60),
        }
    }
}
