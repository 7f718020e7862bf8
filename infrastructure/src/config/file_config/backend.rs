//! Backend API configuration from TOML (`[backend]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    pub base_url: String,
    /// Path probed to decide whether queued messages can be flushed
    pub health_path: String,
    pub timeout_seconds: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            health_path: "/health".to_string(),
            timeout_seconds: 15,
        }
    }
}
