use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::Backoff;

/// Tuning for a [`HashChain`](crate::HashChain).
///
/// Every field has a default, so a partial TOML table is enough.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Retries after the first append attempt loses its index.
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub initial_backoff_ms: u64,
    /// Upper bound for any single backoff.
    pub max_backoff_ms: u64,
    /// Limit for each individual store call.
    pub store_timeout_ms: u64,
    /// Blocks fetched per page by [`ChainCursor`](crate::ChainCursor).
    pub page_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            initial_backoff_ms: 5,
            max_backoff_ms: 250,
            store_timeout_ms: 5_000,
            page_size: 256,
        }
    }
}

impl LedgerConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }

    /// Total attempts an append may make, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
