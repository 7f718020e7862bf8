//! LLM Gateway port
//!
//! Defines the interface for communicating with LLM providers.

use async_trait::async_trait;
use bestself_domain::{Message, Model};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("The model returned an empty reply")]
    EmptyResponse,

    #[error("Other error: {0}")]
    Other(String),
}

/// One chat-completion request: ordered turns plus sampling parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: Model,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with LLM providers.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send the turns and return the reply text
    async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError>;
}
