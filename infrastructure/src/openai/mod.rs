//! OpenAI-compatible chat completion adapter
//!
//! Implements [`LlmGateway`](bestself_application::LlmGateway) over
//! `POST {base}/v1/chat/completions`.

mod gateway;
mod protocol;

pub use gateway::OpenAiGateway;
