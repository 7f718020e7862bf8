//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Conversion into application parameters happens here so the CLI only sees
//! [`ChatParams`] and [`SyncParams`].

mod backend;
mod chat;
mod llm;
mod output;
mod repl;
mod sync;

pub use backend::FileBackendConfig;
pub use chat::FileChatConfig;
pub use llm::FileLlmConfig;
pub use output::FileOutputConfig;
pub use repl::FileReplConfig;
pub use sync::FileSyncConfig;

use bestself_application::{ChatParams, SyncParams};
use bestself_domain::{AgentType, Model};
use serde::{Deserialize, Serialize};

/// How serious a configuration issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The setting cannot work; a fallback is used
    Error,
    Warning,
}

/// A detected issue in the loaded configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted path of the offending key, e.g. `chat.initial_agent`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn warning(field: &str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.to_string(),
            message,
        }
    }

    fn error(field: &str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            field: field.to_string(),
            message,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub llm: FileLlmConfig,
    pub backend: FileBackendConfig,
    pub chat: FileChatConfig,
    pub sync: FileSyncConfig,
    pub output: FileOutputConfig,
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Nothing here is fatal: every issue has a fallback the CLI reports.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.chat.initial_agent.parse::<AgentType>().is_err() {
            issues.push(ConfigIssue::error(
                "chat.initial_agent",
                format!(
                    "unknown agent '{}', falling back to 'educational'",
                    self.chat.initial_agent
                ),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            issues.push(ConfigIssue::warning(
                "llm.temperature",
                format!(
                    "temperature {} is outside 0.0..=2.0, using 0.7",
                    self.llm.temperature
                ),
            ));
        }

        if self.llm.model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "llm.model",
                "model name is empty, using the default model".to_string(),
            ));
        }

        for (field, url) in [
            ("llm.base_url", &self.llm.base_url),
            ("backend.base_url", &self.backend.base_url),
        ] {
            if url.trim().is_empty() {
                issues.push(ConfigIssue::error(field, format!("{field} cannot be empty")));
            }
        }

        if self.llm.timeout_seconds == 0 || self.backend.timeout_seconds == 0 {
            issues.push(ConfigIssue::warning(
                "timeout_seconds",
                "a timeout of 0 disables the request timeout".to_string(),
            ));
        }

        issues
    }

    /// Chat parameters with invalid values replaced by defaults
    pub fn to_chat_params(&self) -> ChatParams {
        let defaults = ChatParams::default();
        let model = match self.llm.model.trim() {
            "" => Model::default(),
            name => name.parse().unwrap_or_default(),
        };
        let temperature = if (0.0..=2.0).contains(&self.llm.temperature) {
            self.llm.temperature
        } else {
            defaults.temperature
        };
        let initial_agent = self
            .chat
            .initial_agent
            .parse()
            .unwrap_or(defaults.initial_agent);

        defaults
            .with_model(model)
            .with_temperature(temperature)
            .with_max_tokens(self.llm.max_tokens)
            .with_initial_agent(initial_agent)
    }

    pub fn to_sync_params(&self) -> SyncParams {
        self.sync.to_sync_params()
    }
}
