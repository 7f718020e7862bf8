//! Offline sync configuration from TOML (`[sync]` section)

use bestself_application::SyncParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSyncConfig {
    pub initial_retry_secs: u64,
    pub retry_secs: u64,
    pub debounce_ms: u64,
}

impl Default for FileSyncConfig {
    fn default() -> Self {
        Self {
            initial_retry_secs: 5,
            retry_secs: 10,
            debounce_ms: 1000,
        }
    }
}

impl FileSyncConfig {
    pub fn to_sync_params(&self) -> SyncParams {
        SyncParams::default()
            .with_retry_delays(
                Duration::from_secs(self.initial_retry_secs),
                Duration::from_secs(self.retry_secs.max(1)),
            )
            .with_debounce(Duration::from_millis(self.debounce_ms))
    }
}
