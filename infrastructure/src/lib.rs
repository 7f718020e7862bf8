//! Infrastructure layer for bestself-coach
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod auth;
pub mod backend;
pub mod config;
pub mod logging;
pub mod memory;
pub mod openai;

// Re-export commonly used types
pub use auth::FileSessionStore;
pub use backend::{HttpBackendClient, HttpClientError};
pub use config::{
    ConfigIssue, ConfigLoader, FileBackendConfig, FileChatConfig, FileConfig, FileLlmConfig,
    FileOutputConfig, FileReplConfig, FileSyncConfig, Severity,
};
pub use logging::JsonlConversationLogger;
pub use memory::InMemoryBackend;
pub use openai::OpenAiGateway;
