//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod auth;
pub mod backend_error;
pub mod chat_progress;
pub mod connectivity;
pub mod conversation_logger;
pub mod conversation_repository;
pub mod goal_repository;
pub mod llm_gateway;
pub mod persona_repository;
pub mod session_store;
