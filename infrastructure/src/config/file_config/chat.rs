//! Chat configuration from TOML (`[chat]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Agent that opens a new conversation ("educational", "discovery", ...)
    pub initial_agent: String,
    /// JSONL transcript path; no transcript when unset
    pub conversation_log: Option<String>,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            initial_agent: "educational".to_string(),
            conversation_log: None,
        }
    }
}
