//! Configuration file loading for bestself-coach
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `BESTSELF_*` environment variables (`__` separates nested keys)
//! 2. `--config <path>` specified file
//! 3. Project root: `./bestself.toml` or `./.bestself.toml`
//! 4. Global: `~/.config/bestself/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileBackendConfig, FileChatConfig, FileConfig, FileLlmConfig, FileOutputConfig,
    FileReplConfig, FileSyncConfig, Severity,
};
pub use loader::ConfigLoader;
